use async_trait::async_trait;
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, RedisError};
use tracing::info;

use super::{FieldMap, GameStore, StoreError, WriteBatch, WriteOp};

const LOG_TARGET: &str = "store::redis";

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Rejected(err.to_string())
        }
    }
}

/// [`GameStore`] backed by a Redis server. The connection manager is shared
/// by every clone and reconnects on its own.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        let addr = client.get_connection_info().addr.to_string();
        let connection = ConnectionManager::new(client).await?;
        info!(target: LOG_TARGET, %addr, "connected to redis");
        Ok(Self { connection })
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl GameStore for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let exists: bool = self.conn().exists(key).await?;
        Ok(exists)
    }

    async fn read_fields(&self, key: &str) -> Result<FieldMap, StoreError> {
        let fields: FieldMap = self.conn().hgetall(key).await?;
        Ok(fields)
    }

    async fn write_fields(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let () = self.conn().hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn set_score(&self, set: &str, member: &str, score: f64) -> Result<(), StoreError> {
        let () = self.conn().zadd(set, member, score).await?;
        Ok(())
    }

    async fn remove_member(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let () = self.conn().zrem(set, member).await?;
        Ok(())
    }

    async fn read_ranked_descending(&self, set: &str) -> Result<Vec<(String, f64)>, StoreError> {
        let ranked: Vec<(String, f64)> = self.conn().zrevrange_withscores(set, 0, -1).await?;
        Ok(ranked)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for op in batch.into_ops() {
            match op {
                WriteOp::WriteFields { key, fields } => {
                    if !fields.is_empty() {
                        pipe.hset_multiple(key, fields.as_slice()).ignore();
                    }
                }
                WriteOp::SetScore { set, member, score } => {
                    pipe.zadd(set, member, score).ignore();
                }
                WriteOp::RemoveMember { set, member } => {
                    pipe.zrem(set, member).ignore();
                }
            }
        }

        let mut conn = self.conn();
        let () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}
