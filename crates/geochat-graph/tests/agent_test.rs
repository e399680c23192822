use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use geochat_graph::{Agent, AgentConfig, StreamEvent};
use geochat_llm::{ChatClient, ChatRequest, ChatResponse, Message, TokenUsage, Tool, ToolCall};
use geochat_mcp::{McpError, ToolExecutor};
use geochat_persist::{list_thread_ids, Checkpointer, MemorySaver};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned responses and records the requests it received
struct ScriptedClient {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted response left"))
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}

struct GeoTools;

#[async_trait]
impl ToolExecutor for GeoTools {
    async fn tools(&self) -> Result<Vec<Tool>, McpError> {
        Ok(vec![Tool::new("altitude", "Altitude of a point", json!({"type": "object"}))])
    }

    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<String, McpError> {
        match tool_name {
            "altitude" => Ok(json!({"altitude": 35.2, "lon": arguments["lon"]}).to_string()),
            other => Err(McpError::UnknownTool(other.to_string())),
        }
    }
}

fn text(content: &str) -> ChatResponse {
    ChatResponse {
        content: Some(content.to_string()),
        tool_calls: None,
        usage: Some(TokenUsage::new(10, 5)),
        finish_reason: Some("stop".into()),
        raw: json!({}),
    }
}

fn calls(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse {
        content: None,
        tool_calls: Some(calls),
        usage: Some(TokenUsage::new(20, 8)),
        finish_reason: Some("tool_calls".into()),
        raw: json!({}),
    }
}

async fn agent(client: Arc<ScriptedClient>, saver: Arc<MemorySaver>, config: AgentConfig) -> Agent {
    Agent::builder()
        .chat_client(client)
        .tools(Arc::new(GeoTools))
        .checkpointer(saver)
        .config(config)
        .build()
        .await
        .unwrap()
}

async fn drain(mut rx: tokio::sync::mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_tool_loop_persists_every_step() {
    let client = ScriptedClient::new(vec![
        calls(vec![ToolCall::new("c1", "altitude", r#"{"lon":2.35,"lat":48.85}"#)]),
        text("The altitude is 35 m."),
    ]);
    let saver = Arc::new(MemorySaver::new());
    let agent = agent(client.clone(), saver.clone(), AgentConfig::default()).await;

    let events = drain(agent.run_turn("thread-geo", "Altitude of Paris?")).await;

    let nodes: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::NodeUpdate { node, .. } => Some(node.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(nodes, vec!["call_model", "tools", "call_model"]);
    assert!(matches!(events.first(), Some(StreamEvent::InitStream { .. })));
    assert!(matches!(events.last(), Some(StreamEvent::EndStream { status, .. }) if status == "success"));

    let latest = saver.get_latest("thread-geo").await.unwrap().unwrap();
    assert_eq!(latest.messages.len(), 4);
    assert_eq!(latest.messages[0], Message::human("Altitude of Paris?"));
    assert_eq!(latest.messages[2].kind(), "tool");
    assert!(latest.messages[2].text().contains("35.2"));
    assert_eq!(latest.messages[3].text(), "The altitude is 35 m.");

    // input + three nodes
    assert_eq!(saver.list("thread-geo").await.unwrap().len(), 4);

    // tools are bound to every request
    let requests = client.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.options.tools.as_ref().map(Vec::len) == Some(1)));
}

#[tokio::test]
async fn test_second_turn_sees_previous_messages() {
    let client = ScriptedClient::new(vec![text("Bonjour"), text("Paris")]);
    let saver = Arc::new(MemorySaver::new());
    let agent = agent(client.clone(), saver.clone(), AgentConfig::default()).await;

    drain(agent.run_turn("thread-a", "Salut")).await;
    drain(agent.run_turn("thread-a", "Capitale de la France ?")).await;

    assert_eq!(client.requests.lock().unwrap()[1].messages.len(), 3);

    let history: Vec<_> = agent.history("thread-a").collect().await;
    let texts: Vec<String> = history.into_iter().map(|r| r.unwrap().0.text()).collect();
    assert_eq!(texts, vec!["Salut", "Bonjour", "Capitale de la France ?", "Paris"]);

    assert_eq!(list_thread_ids(saver.as_ref()).await, vec!["thread-a"]);
}

#[tokio::test]
async fn test_tool_failure_is_reported_to_model() {
    let client = ScriptedClient::new(vec![
        calls(vec![ToolCall::new("c1", "unknown_tool", "{}")]),
        text("Sorry, that tool is unavailable."),
    ]);
    let saver = Arc::new(MemorySaver::new());
    let agent = agent(client, saver.clone(), AgentConfig::default()).await;

    drain(agent.run_turn("thread-err", "Try it")).await;

    let latest = saver.get_latest("thread-err").await.unwrap().unwrap();
    assert!(latest.messages[2].text().starts_with("Tool execution failed:"));
    assert_eq!(latest.messages.len(), 4);
}

#[tokio::test]
async fn test_max_iterations_emits_error() {
    let looping: Vec<ChatResponse> = (0..5)
        .map(|i| calls(vec![ToolCall::new(format!("c{}", i), "altitude", "{}")]))
        .collect();
    let client = ScriptedClient::new(looping);
    let saver = Arc::new(MemorySaver::new());
    let agent = agent(client, saver, AgentConfig::default().with_max_iterations(3)).await;

    let events = drain(agent.run_turn("thread-loop", "loop")).await;

    assert!(events.iter().any(|e| matches!(e, StreamEvent::Error { message, .. } if message.contains("Max iterations"))));
    assert!(matches!(events.last(), Some(StreamEvent::EndStream { status, .. }) if status == "max_iterations"));
}

#[tokio::test]
async fn test_thread_usable_after_max_iterations() {
    let client = ScriptedClient::new(vec![
        calls(vec![ToolCall::new("c0", "altitude", "{}")]),
        calls(vec![ToolCall::new("c1", "altitude", "{}"), ToolCall::new("c2", "altitude", "{}")]),
        text("Done."),
    ]);
    let saver = Arc::new(MemorySaver::new());
    let agent = agent(client.clone(), saver.clone(), AgentConfig::default().with_max_iterations(3)).await;

    let events = drain(agent.run_turn("thread-cut", "loop")).await;
    assert!(matches!(events.last(), Some(StreamEvent::EndStream { status, .. }) if status == "max_iterations"));

    let latest = saver.get_latest("thread-cut").await.unwrap().unwrap();
    let last = latest.messages.last().unwrap();
    assert_eq!(last.kind(), "tool");
    assert!(last.text().contains("skipped"));

    let events = drain(agent.run_turn("thread-cut", "and now?")).await;
    assert!(matches!(events.last(), Some(StreamEvent::EndStream { status, .. }) if status == "success"));

    let requests = client.requests.lock().unwrap();
    let sent = &requests[2].messages;
    assert_eq!(sent.last(), Some(&Message::human("and now?")));
    for call in sent.iter().flat_map(|m| m.tool_calls().to_vec()) {
        assert!(
            sent.iter().any(|m| matches!(m, Message::Tool { tool_call_id, .. } if *tool_call_id == call.id)),
            "tool call {} has no result",
            call.id
        );
    }
}

#[tokio::test]
async fn test_model_failure_emits_error_and_keeps_input() {
    let client = ScriptedClient::new(vec![]);
    let saver = Arc::new(MemorySaver::new());
    let agent = agent(client, saver.clone(), AgentConfig::default()).await;

    let events = drain(agent.run_turn("thread-down", "hello?")).await;

    assert!(matches!(events.last(), Some(StreamEvent::Error { .. })));
    let latest = saver.get_latest("thread-down").await.unwrap().unwrap();
    assert_eq!(latest.messages, vec![Message::human("hello?")]);
}

#[tokio::test]
async fn test_system_prompt_is_not_stored() {
    let client = ScriptedClient::new(vec![text("ok")]);
    let saver = Arc::new(MemorySaver::new());
    let config = AgentConfig::default().with_system_prompt("Answer in French");
    let agent = agent(client.clone(), saver.clone(), config).await;

    drain(agent.run_turn("thread-sys", "hi")).await;

    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[0].messages[0].role(), "system");
    let latest = saver.get_latest("thread-sys").await.unwrap().unwrap();
    assert!(latest.messages.iter().all(|m| m.role() != "system"));
}
