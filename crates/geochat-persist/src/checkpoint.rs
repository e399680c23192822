use chrono::{DateTime, Utc};
use geochat_llm::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mint a new opaque thread id (`thread-` + 32 hex chars)
pub fn new_thread_id() -> String {
    format!("thread-{}", Uuid::new_v4().simple())
}

/// Full snapshot of a thread's messages after one graph step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// `{step:010}-{uuid}`, so lexical order follows write order
    pub id: String,
    pub thread_id: String,
    pub step: i64,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Checkpoint {
    pub fn new(thread_id: impl Into<String>, step: i64, messages: Vec<Message>) -> Self {
        Self {
            id: format!("{:010}-{}", step, Uuid::new_v4().simple()),
            thread_id: thread_id.into(),
            step,
            created_at: Utc::now(),
            messages,
        }
    }

    /// Snapshot following this one, with the given messages
    pub fn next(&self, messages: Vec<Message>) -> Self {
        Self::new(self.thread_id.clone(), self.step + 1, messages)
    }

    pub fn metadata(&self) -> CheckpointMetadata {
        CheckpointMetadata {
            id: self.id.clone(),
            thread_id: self.thread_id.clone(),
            step: self.step,
            created_at: self.created_at,
            message_count: self.messages.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub id: String,
    pub thread_id: String,
    pub step: i64,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_format() {
        let id = new_thread_id();
        let hex = id.strip_prefix("thread-").unwrap();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, new_thread_id());
    }

    #[test]
    fn test_checkpoint_ids_sort_by_step() {
        let first = Checkpoint::new("thread-a", 9, vec![]);
        let second = first.next(vec![Message::human("hello")]);

        assert_eq!(second.step, 10);
        assert!(first.id < second.id);
        assert!(second.id.starts_with("0000000010-"));
        assert_eq!(second.metadata().message_count, 1);
    }
}
