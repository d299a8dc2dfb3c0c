use crate::error::Result;
use crate::kv::{Batch, BatchOp, KvStore};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

/// In-process KV backend with the same semantics as the remote store.
/// Used as the test double and for ephemeral single-process setups.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Maps>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Maps {
    strings: BTreeMap<String, Vec<u8>>,
    sets: BTreeMap<String, BTreeSet<String>>,
    hashes: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

/// Full canonical snapshot of the backend, for equality assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDump {
    pub strings: BTreeMap<String, Vec<u8>>,
    pub sets: BTreeMap<String, BTreeSet<String>>,
    pub hashes: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

impl MemoryDump {
    /// Drop a key from every family, e.g. to ignore the ingest meta
    /// record when comparing two ingests.
    pub fn without_key(mut self, key: &str) -> Self {
        self.strings.remove(key);
        self.sets.remove(key);
        self.hashes.remove(key);
        self
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dump(&self) -> MemoryDump {
        let maps = self.inner.read().await;
        MemoryDump {
            strings: maps.strings.clone(),
            sets: maps.sets.clone(),
            hashes: maps.hashes.clone(),
        }
    }
}

impl Maps {
    fn apply_op(&mut self, op: BatchOp) {
        match op {
            BatchOp::Set { key, value } => {
                self.strings.insert(key, value);
            }
            BatchOp::Del { key } => {
                self.strings.remove(&key);
                self.sets.remove(&key);
                self.hashes.remove(&key);
            }
            BatchOp::SetAdd { key, member } => {
                self.sets.entry(key).or_default().insert(member);
            }
            BatchOp::SetRemove { key, member } => {
                if let Some(set) = self.sets.get_mut(&key) {
                    set.remove(&member);
                    if set.is_empty() {
                        self.sets.remove(&key);
                    }
                }
            }
            BatchOp::HashSet { key, fields } => {
                let hash = self.hashes.entry(key).or_default();
                for (field, value) in fields {
                    hash.insert(field, value);
                }
            }
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.read().await.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.inner
            .write()
            .await
            .strings
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut maps = self.inner.write().await;
        maps.strings.remove(key);
        maps.sets.remove(key);
        maps.hashes.remove(key);
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        self.inner
            .write()
            .await
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        let mut maps = self.inner.write().await;
        if let Some(set) = maps.sets.get_mut(key) {
            set.remove(member);
            if set.is_empty() {
                maps.sets.remove(key);
            }
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .inner
            .read()
            .await
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .inner
            .read()
            .await
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).cloned()))
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, Vec<u8>>> {
        Ok(self
            .inner
            .read()
            .await
            .hashes
            .get(key)
            .map(|hash| hash.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn apply(&self, batch: Batch) -> Result<()> {
        // One write lock for the whole batch gives the all-or-nothing
        // visibility the trait promises.
        let mut maps = self.inner.write().await;
        for op in batch.ops().iter().cloned() {
            maps.apply_op(op);
        }
        Ok(())
    }
}
