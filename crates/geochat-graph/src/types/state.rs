use geochat_llm::{Message, ToolCall};

/// Messages of one thread while a turn runs
#[derive(Debug, Clone)]
pub struct AgentState {
    pub thread_id: String,
    pub run_id: String,
    pub messages: Vec<Message>,
    /// Step of the last checkpoint written for this thread, -1 for none
    pub step: i64,
}

impl AgentState {
    pub fn new(thread_id: impl Into<String>, messages: Vec<Message>, step: i64) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: uuid::Uuid::new_v4().to_string(),
            messages,
            step,
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn has_pending_tool_calls(&self) -> bool {
        self.last_message()
            .map(|msg| !msg.tool_calls().is_empty())
            .unwrap_or(false)
    }

    pub fn get_pending_tool_calls(&self) -> Vec<ToolCall> {
        self.last_message()
            .map(|msg| msg.tool_calls().to_vec())
            .unwrap_or_default()
    }

    pub fn add_tool_result(&mut self, tool_call: &ToolCall, result: String) {
        self.messages.push(Message::Tool {
            tool_call_id: tool_call.id.clone(),
            content: geochat_llm::Content::text(result),
            name: Some(tool_call.function.name.clone()),
        });
    }
}
