use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{FieldMap, GameStore, StoreError, WriteBatch, WriteOp};

#[derive(Default)]
struct Inner {
    hashes: HashMap<String, FieldMap>,
    sorted_sets: HashMap<String, HashMap<String, f64>>,
}

impl Inner {
    fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::WriteFields { key, fields } => {
                let hash = self.hashes.entry(key).or_default();
                for (field, value) in fields {
                    hash.insert(field, value);
                }
            }
            WriteOp::SetScore { set, member, score } => {
                self.sorted_sets.entry(set).or_default().insert(member, score);
            }
            WriteOp::RemoveMember { set, member } => {
                if let Some(members) = self.sorted_sets.get_mut(&set) {
                    members.remove(&member);
                    if members.is_empty() {
                        self.sorted_sets.remove(&set);
                    }
                }
            }
        }
    }
}

/// Process-local store with Redis-compatible semantics for the operations the
/// game needs. Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`]
    /// until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store switched offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl GameStore for InMemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let inner = self.inner.read();
        Ok(inner.hashes.contains_key(key) || inner.sorted_sets.contains_key(key))
    }

    async fn read_fields(&self, key: &str) -> Result<FieldMap, StoreError> {
        self.check_available()?;
        Ok(self.inner.read().hashes.get(key).cloned().unwrap_or_default())
    }

    async fn write_fields(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        self.check_available()?;
        self.inner.write().apply(WriteOp::WriteFields {
            key: key.to_string(),
            fields: fields.to_vec(),
        });
        Ok(())
    }

    async fn set_score(&self, set: &str, member: &str, score: f64) -> Result<(), StoreError> {
        self.check_available()?;
        self.inner.write().apply(WriteOp::SetScore {
            set: set.to_string(),
            member: member.to_string(),
            score,
        });
        Ok(())
    }

    async fn remove_member(&self, set: &str, member: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.inner.write().apply(WriteOp::RemoveMember {
            set: set.to_string(),
            member: member.to_string(),
        });
        Ok(())
    }

    async fn read_ranked_descending(&self, set: &str) -> Result<Vec<(String, f64)>, StoreError> {
        self.check_available()?;
        let inner = self.inner.read();
        let mut ranked: Vec<(String, f64)> = inner
            .sorted_sets
            .get(set)
            .map(|members| {
                members
                    .iter()
                    .map(|(member, score)| (member.clone(), *score))
                    .collect()
            })
            .unwrap_or_default();
        // ZREVRANGE order: score desc, ties by member desc
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        Ok(ranked)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write();
        for op in batch.into_ops() {
            inner.apply(op);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn write_fields_merges_into_existing_hash() {
        let store = InMemoryStore::new();
        assert!(!store.exists("alice").await.unwrap());

        store
            .write_fields("alice", &fields(&[("score", "1"), ("activeCard", "")]))
            .await
            .unwrap();
        store
            .write_fields("alice", &fields(&[("score", "4")]))
            .await
            .unwrap();

        assert!(store.exists("alice").await.unwrap());
        let stored = store.read_fields("alice").await.unwrap();
        assert_eq!(stored.get("score").map(String::as_str), Some("4"));
        assert_eq!(stored.get("activeCard").map(String::as_str), Some(""));
        assert!(store.read_fields("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ranked_read_orders_by_score_then_member_descending() {
        let store = InMemoryStore::new();
        store.set_score("board", "a", 3.0).await.unwrap();
        store.set_score("board", "b", 10.0).await.unwrap();
        store.set_score("board", "c", 3.0).await.unwrap();
        store.set_score("board", "a", 4.0).await.unwrap();

        let ranked = store.read_ranked_descending("board").await.unwrap();
        assert_eq!(
            ranked,
            vec![
                ("b".to_string(), 10.0),
                ("a".to_string(), 4.0),
                ("c".to_string(), 3.0)
            ]
        );

        store.remove_member("board", "b").await.unwrap();
        store.remove_member("board", "missing").await.unwrap();
        assert_eq!(store.read_ranked_descending("board").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn offline_store_rejects_every_call() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.exists("x").await,
            Err(StoreError::Unavailable(_))
        ));

        let mut batch = WriteBatch::new();
        batch.set_score("board", "x", 1.0);
        assert!(store.commit(batch).await.is_err());

        store.set_unavailable(false);
        assert!(store.read_ranked_descending("board").await.unwrap().is_empty());
    }
}
