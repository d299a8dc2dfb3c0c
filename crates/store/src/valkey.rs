use crate::error::{Result, StoreError};
use crate::kv::{Batch, BatchOp, KvStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// RESP-speaking backend (Valkey or Redis). Connections are multiplexed
/// through a [`ConnectionManager`], which reconnects on transport drops.
#[derive(Clone)]
pub struct ValkeyStore {
    conn: ConnectionManager,
    timeout: Duration,
}

impl ValkeyStore {
    /// Connect to `url`, e.g. `redis://127.0.0.1:6379/0`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { conn, timeout })
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(map_redis_err),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

fn map_redis_err(err: redis::RedisError) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn batch_to_pipe(batch: &Batch) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic();
    for op in batch.ops() {
        match op {
            BatchOp::Set { key, value } => {
                pipe.cmd("SET").arg(key).arg(value.as_slice()).ignore();
            }
            BatchOp::Del { key } => {
                pipe.cmd("DEL").arg(key).ignore();
            }
            BatchOp::SetAdd { key, member } => {
                pipe.cmd("SADD").arg(key).arg(member).ignore();
            }
            BatchOp::SetRemove { key, member } => {
                pipe.cmd("SREM").arg(key).arg(member).ignore();
            }
            BatchOp::HashSet { key, fields } => {
                let mut cmd = pipe.cmd("HSET");
                cmd.arg(key);
                for (field, value) in fields {
                    cmd.arg(field).arg(value.as_slice());
                }
                cmd.ignore();
            }
        }
    }
    pipe
}

#[async_trait]
impl KvStore for ValkeyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        self.bounded(async move { redis::cmd("GET").arg(key).query_async(&mut conn).await })
            .await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded(async move {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded(async move {
            redis::cmd("DEL")
                .arg(key)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded(async move {
            redis::cmd("SADD")
                .arg(key)
                .arg(member)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        self.bounded(async move {
            redis::cmd("SREM")
                .arg(key)
                .arg(member)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        self.bounded(async move {
            redis::cmd("SMEMBERS")
                .arg(key)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        self.bounded(async move {
            redis::cmd("HGET")
                .arg(key)
                .arg(field)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, Vec<u8>>> {
        let mut conn = self.conn.clone();
        self.bounded(async move {
            redis::cmd("HGETALL")
                .arg(key)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn apply(&self, batch: Batch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let pipe = batch_to_pipe(&batch);
        let mut conn = self.conn.clone();
        self.bounded(async move { pipe.query_async(&mut conn).await })
            .await
    }
}

// Exercising these requires a live Valkey/Redis on localhost; the
// MemoryStore covers the trait contract in-process.
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn live_round_trip() {
        let store = ValkeyStore::connect("redis://127.0.0.1/", Duration::from_secs(5))
            .await
            .expect("connect");
        store.set("manifold:test:k", b"v").await.expect("set");
        let got = store.get("manifold:test:k").await.expect("get");
        assert_eq!(got, Some(b"v".to_vec()));
        store.del("manifold:test:k").await.expect("del");
    }

    #[tokio::test]
    #[ignore]
    async fn live_batch_is_atomic() {
        let store = ValkeyStore::connect("redis://127.0.0.1/", Duration::from_secs(5))
            .await
            .expect("connect");
        let mut batch = Batch::new();
        batch
            .set("manifold:test:a", b"1".to_vec())
            .set_add("manifold:test:s", "m");
        store.apply(batch).await.expect("apply");
        assert_eq!(
            store.set_members("manifold:test:s").await.expect("members"),
            vec!["m".to_string()]
        );
        store.del("manifold:test:a").await.expect("del");
        store.del("manifold:test:s").await.expect("del");
    }
}
