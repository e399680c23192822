use crate::render::{DisplayKind, DisplayRecord, DisplayRole};

const CHAT_TEMPLATE: &str = include_str!("../assets/chat.html");
const VIEW_TEMPLATE: &str = include_str!("../assets/view.html");
const STYLE: &str = include_str!("../assets/style.css");

pub fn chat_page(chat_base: &str, view_base: &str) -> String {
    let chat_base = js_string(chat_base);
    let view_base = js_string(view_base);
    fill(
        CHAT_TEMPLATE,
        &[
            ("__STYLE__", STYLE),
            ("\"__CHAT_BASE__\"", chat_base.as_str()),
            ("\"__VIEW_BASE__\"", view_base.as_str()),
        ],
    )
}

/// Server-rendered page of a thread; map markup is embedded as is
pub fn view_page(thread_id: Option<&str>, records: &[DisplayRecord]) -> String {
    let (title, body) = match thread_id {
        None => (
            "no thread".to_string(),
            "<p class=\"empty\">No thread selected, add <code>?thread_id=...</code> to the address.</p>".to_string(),
        ),
        Some(id) if records.is_empty() => (
            escape_html(id),
            "<p class=\"empty\">This thread has no messages.</p>".to_string(),
        ),
        Some(id) => (
            escape_html(id),
            records.iter().map(record_html).collect::<Vec<_>>().join("\n"),
        ),
    };

    fill(
        VIEW_TEMPLATE,
        &[("__STYLE__", STYLE), ("__TITLE__", title.as_str()), ("__RECORDS__", body.as_str())],
    )
}

/// Substitute placeholders in one pass so inserted text is never rescanned
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|at| (at, *key, *value)))
            .min_by_key(|(at, _, _)| *at);

        match next {
            Some((at, key, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

fn record_html(record: &DisplayRecord) -> String {
    let role = match record.role {
        DisplayRole::User => "user",
        DisplayRole::Assistant => "assistant",
    };

    let body = match record.kind {
        DisplayKind::Map => format!("<div>{}</div>", record.content),
        _ => format!("<pre>{}</pre>", escape_html(&record.content)),
    };

    match &record.title {
        Some(title) => {
            let open = if record.kind == DisplayKind::Map { " open" } else { "" };
            format!(
                "<div class=\"record {}\"><details{}><summary>{}</summary>{}</details></div>",
                role,
                open,
                escape_html(title),
                body
            )
        }
        None => format!("<div class=\"record {}\">{}</div>", role, body),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON string literal that is safe inside a `<script>` element
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
}
