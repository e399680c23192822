use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::BTreeSet;
use tokio::sync::OnceCell;

use crate::checkpoint::{Checkpoint, CheckpointMetadata};
use crate::checkpointer::Checkpointer;
use crate::error::{PersistError, Result};

const CHECKPOINT_PREFIX: &str = "checkpoint:";
const INDEX_PREFIX: &str = "checkpoint_index:";
const SCAN_COUNT: usize = 200;

/// Redis-backed checkpointer.
///
/// Layout:
/// - `checkpoint:{thread_id}:{checkpoint_id}` holds the snapshot JSON
/// - `checkpoint_index:{thread_id}` lists checkpoint ids in write order
pub struct RedisSaver {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisSaver {
    /// Parse the URL; no connection is opened until first use
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await?;
        Ok(manager.clone())
    }

    pub(crate) async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn checkpoint_key(thread_id: &str, checkpoint_id: &str) -> String {
        format!("{}{}:{}", CHECKPOINT_PREFIX, thread_id, checkpoint_id)
    }

    fn index_key(thread_id: &str) -> String {
        format!("{}{}", INDEX_PREFIX, thread_id)
    }

    /// Thread id of a `checkpoint:{thread_id}:{checkpoint_id}` key
    fn thread_id_from_key(key: &str) -> Option<&str> {
        let rest = key.strip_prefix(CHECKPOINT_PREFIX)?;
        let (thread_id, _checkpoint_id) = rest.rsplit_once(':')?;
        Some(thread_id).filter(|t| !t.is_empty())
    }

    async fn load(&self, conn: &mut ConnectionManager, thread_id: &str, checkpoint_id: &str) -> Result<Option<Checkpoint>> {
        let raw: Option<String> = conn.get(Self::checkpoint_key(thread_id, checkpoint_id)).await?;
        raw.map(|json| {
            serde_json::from_str::<Checkpoint>(&json).map_err(|e| PersistError::Corrupted {
                id: checkpoint_id.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }
}

#[async_trait]
impl Checkpointer for RedisSaver {
    async fn setup(&self) -> Result<()> {
        Ok(())
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(&checkpoint)?;

        let _: () = redis::pipe()
            .atomic()
            .set(Self::checkpoint_key(&checkpoint.thread_id, &checkpoint.id), json)
            .ignore()
            .rpush(Self::index_key(&checkpoint.thread_id), &checkpoint.id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        tracing::debug!(thread_id = %checkpoint.thread_id, checkpoint_id = %checkpoint.id, "Checkpoint stored in Redis");
        Ok(())
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let mut conn = self.connection().await?;
        let latest: Option<String> = conn.lindex(Self::index_key(thread_id), -1).await?;

        match latest {
            Some(checkpoint_id) => self.load(&mut conn, thread_id, &checkpoint_id).await,
            None => Ok(None),
        }
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointMetadata>> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.lrange(Self::index_key(thread_id), 0, -1).await?;

        let mut listed = Vec::with_capacity(ids.len());
        for checkpoint_id in ids {
            if let Some(checkpoint) = self.load(&mut conn, thread_id, &checkpoint_id).await? {
                listed.push(checkpoint.metadata());
            }
        }
        Ok(listed)
    }

    async fn thread_ids(&self) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let pattern = format!("{}*", CHECKPOINT_PREFIX);
        let mut found: BTreeSet<String> = BTreeSet::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            found.extend(
                keys.iter()
                    .filter_map(|k| Self::thread_id_from_key(k))
                    .map(str::to_string),
            );

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(found.into_iter().collect())
    }
}
