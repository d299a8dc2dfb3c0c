use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// One mutation inside an atomic batch.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Set { key: String, value: Vec<u8> },
    Del { key: String },
    SetAdd { key: String, member: String },
    SetRemove { key: String, member: String },
    HashSet { key: String, fields: Vec<(String, Vec<u8>)> },
}

/// An ordered list of mutations applied with all-or-nothing semantics.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.ops.push(BatchOp::Set {
            key: key.into(),
            value,
        });
        self
    }

    pub fn del(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Del { key: key.into() });
        self
    }

    pub fn set_add(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::SetAdd {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn set_remove(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::SetRemove {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn hash_set(
        &mut self,
        key: impl Into<String>,
        fields: Vec<(String, Vec<u8>)>,
    ) -> &mut Self {
        self.ops.push(BatchOp::HashSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append another batch's mutations, preserving order.
    pub fn extend(&mut self, other: Batch) -> &mut Self {
        self.ops.extend(other.ops);
        self
    }
}

/// The operations the core issues against the external key/value
/// service. Keys are ASCII, values are bytes; set members are UTF-8.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    async fn del(&self, key: &str) -> Result<()>;

    async fn set_add(&self, key: &str, member: &str) -> Result<()>;

    async fn set_remove(&self, key: &str, member: &str) -> Result<()>;

    async fn set_members(&self, key: &str) -> Result<Vec<String>>;

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, Vec<u8>>>;

    /// Apply every mutation in `batch` atomically: readers observe all
    /// of them or none of them.
    async fn apply(&self, batch: Batch) -> Result<()>;
}
