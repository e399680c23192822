use anyhow::Result;
use async_stream::try_stream;
use chrono::{DateTime, Utc};
use futures::Stream;
use geochat_llm::Message;
use geochat_persist::Checkpointer;
use std::sync::Arc;

/// Stream the messages of a thread in append order.
///
/// Each message is paired with the creation time of the first checkpoint
/// that contains it. Nothing is read until the stream is polled; a thread
/// without checkpoints yields an empty stream.
pub fn get_messages(
    checkpointer: Arc<dyn Checkpointer>,
    thread_id: impl Into<String>,
) -> impl Stream<Item = Result<(Message, DateTime<Utc>)>> {
    let thread_id = thread_id.into();

    try_stream! {
        if let Some(latest) = checkpointer.get_latest(&thread_id).await? {
            let checkpoints = checkpointer.list(&thread_id).await?;

            for (position, message) in latest.messages.into_iter().enumerate() {
                let created_at = checkpoints
                    .iter()
                    .find(|c| c.message_count > position)
                    .map(|c| c.created_at)
                    .unwrap_or(latest.created_at);
                yield (message, created_at);
            }
        }
    }
}
