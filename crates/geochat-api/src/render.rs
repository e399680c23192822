use geochat_llm::{ContentBlock, Message};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MAP_MARKERS: [&str; 2] = ["<ol-simple-map", "<ol-map"];

pub const THINKING_TITLE: &str = "💭 Thinking";
pub const MAP_TITLE: &str = "🗺️ Map";
pub const TOOL_RESULT_TITLE: &str = "📊 Tool result";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
    Text,
    Thinking,
    Map,
    Json,
    ToolResult,
}

/// One chat bubble
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DisplayRecord {
    pub role: DisplayRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub kind: DisplayKind,
}

impl DisplayRecord {
    fn user(content: String) -> Self {
        Self {
            role: DisplayRole::User,
            content,
            title: None,
            kind: DisplayKind::Text,
        }
    }

    fn assistant(content: String, title: Option<&str>, kind: DisplayKind) -> Self {
        Self {
            role: DisplayRole::Assistant,
            content,
            title: title.map(str::to_string),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Display(DisplayRecord),
    Skip,
}

impl Rendered {
    pub fn into_record(self) -> Option<DisplayRecord> {
        match self {
            Self::Display(record) => Some(record),
            Self::Skip => None,
        }
    }
}

/// Turn a stored message into what the chat widget shows.
///
/// System prompts and messages without any payload are skipped. Tool results
/// carrying map markup are passed through untouched, JSON results are
/// pretty-printed in a fenced block, anything else stays plain text.
pub fn render(message: &Message) -> Rendered {
    let blocks = message.blocks();
    if blocks.is_empty() {
        return Rendered::Skip;
    }

    match message {
        Message::System { .. } => Rendered::Skip,
        Message::Human { .. } => Rendered::Display(DisplayRecord::user(join_blocks(&blocks))),
        Message::AI { .. } => {
            let requests_tools = blocks
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolCall { .. }));
            let content = join_blocks(&blocks);
            Rendered::Display(if requests_tools {
                DisplayRecord::assistant(content, Some(THINKING_TITLE), DisplayKind::Thinking)
            } else {
                DisplayRecord::assistant(content, None, DisplayKind::Text)
            })
        }
        Message::Tool { .. } => Rendered::Display(render_tool_result(&join_blocks(&blocks))),
    }
}

/// Render then drop skipped messages
pub fn render_all<'a>(messages: impl IntoIterator<Item = &'a Message>) -> Vec<DisplayRecord> {
    messages
        .into_iter()
        .filter_map(|m| render(m).into_record())
        .collect()
}

fn join_blocks(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            ContentBlock::Text(text) | ContentBlock::ToolResult(text) => text.clone(),
            ContentBlock::ToolCall { name, args } => format!("🔧 Tool call: {}({})", name, args),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_tool_result(text: &str) -> DisplayRecord {
    // map markup may embed JSON attributes, so it is checked first
    if MAP_MARKERS.iter().any(|marker| text.contains(marker)) {
        return DisplayRecord::assistant(text.to_string(), Some(MAP_TITLE), DisplayKind::Map);
    }

    let pretty = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok());

    match pretty {
        Some(pretty) => DisplayRecord::assistant(
            format!("JSON response:\n```json\n{}\n```", pretty),
            Some(TOOL_RESULT_TITLE),
            DisplayKind::Json,
        ),
        None => DisplayRecord::assistant(text.to_string(), Some(TOOL_RESULT_TITLE), DisplayKind::ToolResult),
    }
}
