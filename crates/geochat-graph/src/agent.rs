use crate::node::{Node, NodeType};
use crate::nodes::{CallModelNode, ToolNode};
use crate::router::{NextNode, Router, SimpleRouter};
use crate::types::{AgentConfig, AgentState, StreamEvent};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::Stream;
use geochat_llm::{ChatClient, Message, Tool};
use geochat_mcp::ToolExecutor;
use geochat_persist::{Checkpoint, Checkpointer};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 256;
const SKIPPED_TOOL_RESULT: &str = "Tool execution skipped: max iterations reached";

/// Compiled agent graph bound to a model, a tool set and a checkpointer
#[derive(Clone)]
pub struct Agent {
    client: Arc<dyn ChatClient>,
    executor: Arc<dyn ToolExecutor>,
    checkpointer: Arc<dyn Checkpointer>,
    tools: Arc<Vec<Tool>>,
    config: AgentConfig,
}

impl Agent {
    pub(crate) fn new(
        client: Arc<dyn ChatClient>,
        executor: Arc<dyn ToolExecutor>,
        checkpointer: Arc<dyn Checkpointer>,
        tools: Vec<Tool>,
        config: AgentConfig,
    ) -> Self {
        Self {
            client,
            executor,
            checkpointer,
            tools: Arc::new(tools),
            config,
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::AgentBuilder {
        crate::builder::AgentBuilder::new()
    }

    pub fn checkpointer(&self) -> Arc<dyn Checkpointer> {
        Arc::clone(&self.checkpointer)
    }

    /// Tools bound to every model request
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Messages of a thread paired with the time they were first checkpointed
    pub fn history(&self, thread_id: impl Into<String>) -> impl Stream<Item = Result<(Message, DateTime<Utc>)>> {
        crate::history::get_messages(self.checkpointer(), thread_id)
    }

    /// Run one turn on a thread in the background and stream its events.
    ///
    /// The receiver yields `InitStream`, one `NodeUpdate` per executed node,
    /// then `EndStream`; a failure yields `Error` and closes the stream.
    pub fn run_turn(&self, thread_id: impl Into<String>, user_text: impl Into<String>) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let agent = self.clone();
        let thread_id = thread_id.into();
        let user_text = user_text.into();

        tokio::spawn(async move {
            if let Err(e) = agent.execute_loop(&thread_id, user_text, tx.clone()).await {
                tracing::error!(thread_id = %thread_id, error = %e, "Turn failed");
                let _ = tx
                    .send(StreamEvent::Error {
                        message: format!("{:#}", e),
                        node_id: None,
                    })
                    .await;
            }
        });

        rx
    }

    async fn save(&self, state: &mut AgentState) -> Result<()> {
        let step = state.step + 1;
        let checkpoint = Checkpoint::new(state.thread_id.clone(), step, state.messages.clone());
        self.checkpointer
            .put(checkpoint)
            .await
            .context("Failed to write checkpoint")?;
        state.step = step;
        Ok(())
    }

    async fn execute_loop(
        &self,
        thread_id: &str,
        user_text: String,
        event_tx: mpsc::Sender<StreamEvent>,
    ) -> Result<()> {
        let start_time = Instant::now();

        let latest = self
            .checkpointer
            .get_latest(thread_id)
            .await
            .context("Failed to load thread")?;
        let (messages, step) = match latest {
            Some(checkpoint) => (checkpoint.messages, checkpoint.step),
            None => (Vec::new(), -1),
        };
        let mut state = AgentState::new(thread_id, messages, step);

        emit(
            &event_tx,
            StreamEvent::InitStream {
                run_id: state.run_id.clone(),
                thread_id: state.thread_id.clone(),
                timestamp: Utc::now().timestamp_millis(),
            },
        ).await;

        state.add_message(Message::human(user_text));
        self.save(&mut state).await?;

        let call_model = CallModelNode::new(
            Arc::clone(&self.client),
            Arc::clone(&self.tools),
            self.config.clone(),
        );
        let tool_node = ToolNode::new(Arc::clone(&self.executor));
        let router = SimpleRouter;

        let mut current_node = NodeType::CallModel;
        let mut iteration = 0;

        loop {
            // Guardrail: max iterations
            if iteration >= self.config.max_iterations {
                tracing::warn!(thread_id = %thread_id, max = self.config.max_iterations, "Max iterations reached");

                // Every stored tool call needs a result or providers reject the next turn
                if state.has_pending_tool_calls() {
                    let messages_before = state.messages.len();
                    for tool_call in state.get_pending_tool_calls() {
                        state.add_tool_result(&tool_call, SKIPPED_TOOL_RESULT.to_string());
                    }
                    self.save(&mut state).await?;
                    emit(
                        &event_tx,
                        StreamEvent::NodeUpdate {
                            node: NodeType::Tools.name().to_string(),
                            messages: state.messages[messages_before..].to_vec(),
                        },
                    ).await;
                }

                emit(
                    &event_tx,
                    StreamEvent::Error {
                        message: format!("Max iterations ({}) reached", self.config.max_iterations),
                        node_id: Some(current_node.name().to_string()),
                    },
                ).await;
                emit(
                    &event_tx,
                    StreamEvent::EndStream {
                        status: "max_iterations".to_string(),
                        total_duration_ms: start_time.elapsed().as_millis() as u64,
                    },
                ).await;
                return Ok(());
            }

            let messages_before = state.messages.len();

            let node: &dyn Node = match current_node {
                NodeType::CallModel => &call_model,
                NodeType::Tools => &tool_node,
            };
            node.execute(&mut state).await?;
            self.save(&mut state).await?;

            emit(
                &event_tx,
                StreamEvent::NodeUpdate {
                    node: current_node.name().to_string(),
                    messages: state.messages[messages_before..].to_vec(),
                },
            ).await;

            match router.next(&state, current_node) {
                NextNode::End => break,
                NextNode::CallModel => current_node = NodeType::CallModel,
                NextNode::Tools => current_node = NodeType::Tools,
            }

            iteration += 1;
        }

        emit(
            &event_tx,
            StreamEvent::EndStream {
                status: "success".to_string(),
                total_duration_ms: start_time.elapsed().as_millis() as u64,
            },
        ).await;

        Ok(())
    }
}

/// Send an event; a departed listener does not stop the turn
async fn emit(event_tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) {
    if event_tx.send(event).await.is_err() {
        tracing::debug!("Event receiver dropped, turn continues");
    }
}
