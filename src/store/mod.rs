use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

pub mod in_memory;
pub mod redis;

pub use self::in_memory::InMemoryStore;
pub use self::redis::RedisStore;

/// Raw hash-field contents as they come back from the store.
pub type FieldMap = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store was reachable but refused the command.
    #[error("store rejected command: {0}")]
    Rejected(String),
}

/// A single mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    WriteFields {
        key: String,
        fields: Vec<(String, String)>,
    },
    SetScore {
        set: String,
        member: String,
        score: f64,
    },
    RemoveMember {
        set: String,
        member: String,
    },
}

/// Mutations committed together by [`GameStore::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_fields<K, V>(&mut self, key: &str, fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.ops.push(WriteOp::WriteFields {
            key: key.to_string(),
            fields: fields
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        });
    }

    pub fn set_score(&mut self, set: &str, member: &str, score: f64) {
        self.ops.push(WriteOp::SetScore {
            set: set.to_string(),
            member: member.to_string(),
            score,
        });
    }

    pub fn remove_member(&mut self, set: &str, member: &str) {
        self.ops.push(WriteOp::RemoveMember {
            set: set.to_string(),
            member: member.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Contract over the remote key-value / sorted-set store.
///
/// Every call surfaces connectivity problems as [`StoreError::Unavailable`].
/// Single calls are atomic only as far as the backing store guarantees for
/// one command; use [`GameStore::commit`] to group mutations.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Returns an empty map for a missing key.
    async fn read_fields(&self, key: &str) -> Result<FieldMap, StoreError>;

    async fn write_fields(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    async fn set_score(&self, set: &str, member: &str, score: f64) -> Result<(), StoreError>;

    async fn remove_member(&self, set: &str, member: &str) -> Result<(), StoreError>;

    /// Members with scores, highest score first.
    async fn read_ranked_descending(&self, set: &str) -> Result<Vec<(String, f64)>, StoreError>;

    /// Applies every op in the batch as one unit.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
