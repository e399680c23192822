use geochat_llm::Message;
use serde::{Deserialize, Serialize};

/// Events emitted while a turn runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Turn started
    InitStream {
        run_id: String,
        thread_id: String,
        timestamp: i64,
    },

    /// Messages appended by one node
    NodeUpdate {
        node: String,
        messages: Vec<Message>,
    },

    /// The turn failed or was cut short
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
    },

    /// Turn completed
    EndStream {
        status: String,
        total_duration_ms: u64,
    },
}
