use async_trait::async_trait;

use crate::checkpoint::{Checkpoint, CheckpointMetadata};
use crate::error::Result;

/// Storage for per-thread checkpoint snapshots
///
/// Implementations are append-only: a checkpoint is never updated or
/// deleted once written.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Prepare tables or indexes; safe to call more than once
    async fn setup(&self) -> Result<()>;

    /// Append one snapshot for `checkpoint.thread_id`
    async fn put(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Newest snapshot of a thread, if any
    async fn get_latest(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Snapshots of a thread in write order
    async fn list(&self, thread_id: &str) -> Result<Vec<CheckpointMetadata>>;

    /// Every thread with at least one checkpoint, sorted and deduplicated
    async fn thread_ids(&self) -> Result<Vec<String>>;
}

/// Thread ids for admin listings; storage failures degrade to an empty list
pub async fn list_thread_ids(checkpointer: &dyn Checkpointer) -> Vec<String> {
    match checkpointer.thread_ids().await {
        Ok(mut ids) => {
            ids.sort();
            ids.dedup();
            ids
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to retrieve thread ids from checkpointer");
            Vec::new()
        }
    }
}
