use anyhow::Result;
use futures::{pin_mut, StreamExt};
use geochat_graph::{get_messages, Agent, StreamEvent};
use geochat_persist::{list_thread_ids, new_thread_id, Checkpointer};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::{render, render_all, DisplayRecord, DisplayRole};

/// Print every known thread id, one per line
pub async fn print_threads<W: Write>(checkpointer: &dyn Checkpointer, out: &mut W) -> Result<()> {
    for thread_id in list_thread_ids(checkpointer).await {
        writeln!(out, "{}", thread_id)?;
    }
    Ok(())
}

/// Dump the stored messages of a thread with their timestamps
pub async fn print_messages<W: Write>(
    checkpointer: Arc<dyn Checkpointer>,
    thread_id: &str,
    out: &mut W,
) -> Result<()> {
    let messages = get_messages(checkpointer, thread_id);
    pin_mut!(messages);

    let mut count = 0;
    while let Some(item) = messages.next().await {
        let (message, created_at) = item?;
        count += 1;
        writeln!(out, "--- {} [{}] {}", count, message.kind(), created_at.to_rfc3339())?;
        match render(&message).into_record() {
            Some(record) => writeln!(out, "{}", record.content)?,
            None => writeln!(out, "(empty)")?,
        }
    }

    if count == 0 {
        writeln!(out, "No messages for {}", thread_id)?;
    }
    Ok(())
}

/// Terminal chat on one thread; `quit`, `exit`, `q` or end of input stops it
pub async fn chat(agent: Agent, thread_id: Option<String>) -> Result<()> {
    let thread_id = thread_id.unwrap_or_else(new_thread_id);
    println!("Thread: {}", thread_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("User: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("Goodbye!");
            break;
        }

        let mut events = agent.run_turn(thread_id.clone(), input);
        while let Some(event) = events.recv().await {
            match event {
                StreamEvent::NodeUpdate { messages, .. } => {
                    for record in render_all(&messages) {
                        println!("{}\n", format_record(&record));
                    }
                }
                StreamEvent::Error { message, .. } => eprintln!("Error: {}", message),
                StreamEvent::InitStream { .. } | StreamEvent::EndStream { .. } => {}
            }
        }
    }

    Ok(())
}

pub fn format_record(record: &DisplayRecord) -> String {
    let speaker = match record.role {
        DisplayRole::User => "User",
        DisplayRole::Assistant => "Assistant",
    };
    match &record.title {
        Some(title) => format!("{} ({}):\n{}", speaker, title, record.content),
        None => format!("{}:\n{}", speaker, record.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geochat_llm::Message;
    use geochat_persist::{Checkpoint, MemorySaver};

    #[tokio::test]
    async fn test_print_threads_sorted() {
        let saver = MemorySaver::new();
        saver.put(Checkpoint::new("thread-b", 0, vec![Message::human("b")])).await.unwrap();
        saver.put(Checkpoint::new("thread-a", 0, vec![Message::human("a")])).await.unwrap();

        let mut out = Vec::new();
        print_threads(&saver, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "thread-a\nthread-b\n");
    }

    #[tokio::test]
    async fn test_print_messages() {
        let saver = Arc::new(MemorySaver::new());
        saver
            .put(Checkpoint::new("thread-a", 0, vec![Message::human("hi"), Message::ai("hello")]))
            .await
            .unwrap();

        let mut out = Vec::new();
        print_messages(saver.clone(), "thread-a", &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("--- 1 [human]"));
        assert!(text.contains("--- 2 [ai]"));
        assert!(text.contains("hello"));

        let mut out = Vec::new();
        print_messages(saver, "thread-missing", &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No messages for thread-missing\n");
    }

    #[test]
    fn test_format_record() {
        let record = render(&Message::tool_result("c1", "plain")).into_record().unwrap();
        assert_eq!(format_record(&record), "Assistant (📊 Tool result):\nplain");
    }
}
