use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::{pin_mut, StreamExt};
use geochat_llm::Message;
use geochat_persist::{list_thread_ids, Checkpointer};
use std::io::Write;
use std::sync::Arc;

pub const CSV_HEADER: [&str; 8] = [
    "THREAD_ID",
    "MESSAGE_COUNT",
    "MESSAGE_DATE",
    "MESSAGE_TYPE",
    "INPUT_TOKENS",
    "OUTPUT_TOKENS",
    "TOTAL_TOKENS",
    "MESSAGE_CONTENT",
];

/// Write one CSV row per stored message of every thread
pub async fn write_stats<W: Write>(checkpointer: Arc<dyn Checkpointer>, out: &mut W) -> Result<()> {
    write_row(out, &CSV_HEADER.map(str::to_string))?;

    for thread_id in list_thread_ids(checkpointer.as_ref()).await {
        let messages = geochat_graph::get_messages(Arc::clone(&checkpointer), thread_id.clone());
        pin_mut!(messages);

        let mut position = 0;
        while let Some(item) = messages.next().await {
            let (message, created_at) = item?;
            position += 1;
            write_row(out, &stats_row(&thread_id, position, &message, created_at))?;
        }
    }

    out.flush()?;
    Ok(())
}

fn stats_row(thread_id: &str, position: usize, message: &Message, created_at: DateTime<Utc>) -> [String; 8] {
    let (input, output, total) = message
        .usage()
        .map(|u| (u.input_tokens, u.output_tokens, u.total_tokens))
        .unwrap_or((0, 0, 0));

    let content = match message {
        Message::Human { .. } => message.text(),
        _ => "NA".to_string(),
    };

    [
        thread_id.to_string(),
        position.to_string(),
        created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        message.kind().to_string(),
        input.to_string(),
        output.to_string(),
        total.to_string(),
        content,
    ]
}

fn write_row<W: Write>(out: &mut W, fields: &[String]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{}", line)
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geochat_llm::TokenUsage;
    use geochat_persist::{Checkpoint, MemorySaver};

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[tokio::test]
    async fn test_rows_per_message() {
        let saver = Arc::new(MemorySaver::new());
        let first = Checkpoint::new("thread-b", 0, vec![Message::human("Altitude, please")]);
        let second = first.next(vec![
            Message::human("Altitude, please"),
            Message::ai("35 m").with_usage(TokenUsage::new(12, 3)),
        ]);
        saver.put(first).await.unwrap();
        saver.put(second).await.unwrap();
        saver
            .put(Checkpoint::new("thread-a", 0, vec![Message::human("hi")]))
            .await
            .unwrap();

        let mut out = Vec::new();
        write_stats(saver, &mut out).await.unwrap();
        let csv = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].starts_with("thread-a,1,"));
        assert!(lines[1].ends_with(",human,0,0,0,hi"));
        assert!(lines[2].ends_with(",human,0,0,0,\"Altitude, please\""));
        assert!(lines[3].starts_with("thread-b,2,"));
        assert!(lines[3].ends_with(",ai,12,3,15,NA"));
    }

    #[tokio::test]
    async fn test_empty_store_writes_header_only() {
        let mut out = Vec::new();
        write_stats(Arc::new(MemorySaver::new()), &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", CSV_HEADER.join(",")));
    }
}
