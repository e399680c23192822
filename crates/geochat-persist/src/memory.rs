use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::checkpoint::{Checkpoint, CheckpointMetadata};
use crate::checkpointer::Checkpointer;
use crate::error::Result;

/// Process-local checkpointer; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemorySaver {
    threads: RwLock<HashMap<String, Vec<Checkpoint>>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn setup(&self) -> Result<()> {
        Ok(())
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        self.threads
            .write()
            .await
            .entry(checkpoint.thread_id.clone())
            .or_default()
            .push(checkpoint);
        Ok(())
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self
            .threads
            .read()
            .await
            .get(thread_id)
            .and_then(|checkpoints| checkpoints.last().cloned()))
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointMetadata>> {
        Ok(self
            .threads
            .read()
            .await
            .get(thread_id)
            .map(|checkpoints| checkpoints.iter().map(Checkpoint::metadata).collect())
            .unwrap_or_default())
    }

    async fn thread_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.threads.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
