use geochat_llm::types::{ContentPart, FunctionCall};
use geochat_llm::{Content, ContentBlock, Message, TokenUsage, Tool, ToolCall, ToolChoice};
use serde_json::json;

#[test]
fn test_content_text_creation() {
    let content = Content::text("Hello, world!");
    assert_eq!(content.as_text(), Some("Hello, world!"));
}

#[test]
fn test_content_from_string() {
    let content: Content = "Test".into();
    assert_eq!(content.as_text(), Some("Test"));
}

#[test]
fn test_content_parts_join() {
    let content = Content::Parts(vec![
        ContentPart::Text { text: "first".into() },
        ContentPart::Text { text: "second".into() },
    ]);

    assert_eq!(content.as_text(), None);
    assert_eq!(content.joined_text(), "first\nsecond");
    assert!(!content.is_empty());
}

#[test]
fn test_message_roles_and_kinds() {
    assert_eq!(Message::system("You are helpful").role(), "system");
    assert_eq!(Message::human("Hello").role(), "user");
    assert_eq!(Message::human("Hello").kind(), "human");
    assert_eq!(Message::ai("Hi there!").role(), "assistant");
    assert_eq!(Message::ai("Hi there!").kind(), "ai");
    assert_eq!(Message::tool_result("call_123", "42").kind(), "tool");
}

#[test]
fn test_message_serialization_human() {
    let msg = Message::human("Hello");
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"role\":\"user\""));
    assert!(json.contains("Hello"));
}

#[test]
fn test_message_usage_survives_serialization() {
    let msg = Message::ai("Response").with_usage(TokenUsage::new(7, 3));
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["role"], "assistant");
    assert_eq!(value["usage"]["total_tokens"], 10);

    let back: Message = serde_json::from_value(value).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn test_message_deserialization_without_optional_fields() {
    let msg: Message = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
    assert_eq!(msg.role(), "assistant");
    assert!(msg.blocks().is_empty());

    let msg: Message =
        serde_json::from_str(r#"{"role":"tool","tool_call_id":"c1","content":"ok"}"#).unwrap();
    assert_eq!(msg.text(), "ok");
}

#[test]
fn test_tool_creation() {
    let tool = Tool::new(
        "geocode",
        "Geocode an address",
        json!({
            "type": "object",
            "properties": {
                "q": {"type": "string"}
            }
        }),
    );

    assert_eq!(tool.name(), "geocode");
    assert!(tool.function.description.is_some());
}

#[test]
fn test_tool_choice_serialization() {
    assert_eq!(serde_json::to_value(ToolChoice::auto()).unwrap(), "auto");
    assert_eq!(serde_json::to_value(ToolChoice::none()).unwrap(), "none");
    assert_eq!(serde_json::to_value(ToolChoice::required()).unwrap(), "required");
}

#[test]
fn test_tool_choice_force() {
    match ToolChoice::force("create_map") {
        ToolChoice::Specific { tool_type, function } => {
            assert_eq!(tool_type, "function");
            assert_eq!(function.name, "create_map");
        }
        _ => panic!("Expected Specific variant"),
    }
}

#[test]
fn test_tool_call_parse_arguments() {
    let tool_call = ToolCall {
        id: "call_123".to_string(),
        tool_type: "function".to_string(),
        function: FunctionCall {
            name: "altitude".to_string(),
            arguments: r#"{"lon":2.35,"lat":48.85}"#.to_string(),
        },
    };

    #[derive(serde::Deserialize)]
    struct Point {
        lon: f64,
        lat: f64,
    }

    let args: Point = tool_call.parse_arguments().unwrap();
    assert_eq!(args.lon, 2.35);
    assert_eq!(args.lat, 48.85);
}

#[test]
fn test_blocks_for_ai_with_text_and_tools() {
    let msg = Message::AI {
        content: Some(Content::text("Let me look that up")),
        tool_calls: Some(vec![
            ToolCall::new("c1", "geocode", r#"{"q":"Lyon"}"#),
            ToolCall::new("c2", "broken", "not json"),
        ]),
        name: None,
        usage: None,
    };

    let blocks = msg.blocks();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], ContentBlock::Text("Let me look that up".into()));
    assert_eq!(
        blocks[1],
        ContentBlock::ToolCall { name: "geocode".into(), args: json!({"q": "Lyon"}) }
    );
    assert_eq!(
        blocks[2],
        ContentBlock::ToolCall { name: "broken".into(), args: json!("not json") }
    );
}

#[test]
fn test_blocks_skip_empty_text() {
    assert!(Message::human("").blocks().is_empty());
    assert!(Message::tool_result("c1", "").blocks().is_empty());
    assert_eq!(
        Message::tool_result("c1", "42").blocks(),
        vec![ContentBlock::ToolResult("42".into())]
    );
}
