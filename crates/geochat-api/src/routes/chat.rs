use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html,
    },
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use futures::pin_mut;
use geochat_graph::{Agent, StreamEvent};
use geochat_persist::new_thread_id;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::ToSchema;

use crate::{
    auth::User,
    error::{ApiError, ApiResult},
    pages,
    render::{render, render_all, DisplayRecord},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewThreadResponse {
    pub thread_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub thread_id: String,
    pub records: Vec<DisplayRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    pub content: String,
}

/// Chat page
pub async fn chat_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(pages::chat_page(
        &state.settings.chat_base(),
        &state.settings.view_base(),
    ))
}

/// Start a new discussion
#[utoipa::path(
    post,
    path = "/api/threads",
    responses(
        (status = 200, description = "Fresh thread id, relative to chat_path", body = NewThreadResponse)
    ),
    tag = "chat"
)]
pub async fn new_thread(user: User) -> Json<NewThreadResponse> {
    let thread_id = new_thread_id();
    tracing::info!(user = %user.id, thread_id = %thread_id, "New discussion");
    Json(NewThreadResponse { thread_id })
}

/// Rendered history of a thread
#[utoipa::path(
    get,
    path = "/api/history",
    params(
        ("thread_id" = Option<String>, Query, description = "Thread to load; a fresh id is returned when missing")
    ),
    responses(
        (status = 200, description = "Display records, relative to chat_path", body = HistoryResponse),
        (status = 500, description = "Storage unavailable")
    ),
    tag = "chat"
)]
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let Some(thread_id) = non_empty(query.thread_id) else {
        return Ok(Json(HistoryResponse {
            thread_id: new_thread_id(),
            records: Vec::new(),
        }));
    };

    let records = load_records(&state.agent, &thread_id).await?;
    Ok(Json(HistoryResponse { thread_id, records }))
}

/// Send a message and stream the turn using Server-Sent Events
///
/// Events: `thread` once with the thread id, `record` per rendered message,
/// `error` if the turn fails, `done` when it completes.
#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Streaming response, relative to chat_path", content_type = "text/event-stream"),
        (status = 400, description = "Empty message")
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Message content is empty".to_string()));
    }

    let thread_id = non_empty(req.thread_id).unwrap_or_else(new_thread_id);
    tracing::info!(user = %user.id, thread_id = %thread_id, "Turn requested");

    let event_receiver = state.agent.run_turn(thread_id.clone(), content);

    let opening = sse_event("thread", &json!({ "thread_id": thread_id }));
    let sse_stream = stream::iter(opening)
        .chain(ReceiverStream::new(event_receiver).flat_map(|event| stream::iter(to_sse_events(event))))
        .map(Ok::<Event, Infallible>);

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

/// Read and render the stored messages of a thread
pub(crate) async fn load_records(agent: &Agent, thread_id: &str) -> ApiResult<Vec<DisplayRecord>> {
    let history = agent.history(thread_id.to_string());
    pin_mut!(history);

    let mut records = Vec::new();
    while let Some(item) = history.next().await {
        let (message, _) = item?;
        if let Some(record) = render(&message).into_record() {
            records.push(record);
        }
    }
    Ok(records)
}

fn to_sse_events(event: StreamEvent) -> Vec<Event> {
    match event {
        StreamEvent::InitStream { run_id, .. } => {
            tracing::debug!(run_id = %run_id, "Turn started");
            Vec::new()
        }
        StreamEvent::NodeUpdate { messages, .. } => render_all(&messages)
            .iter()
            .filter_map(|record| sse_event("record", record))
            .collect(),
        StreamEvent::Error { message, node_id } => {
            sse_event("error", &json!({ "error": message, "node": node_id }))
                .into_iter()
                .collect()
        }
        StreamEvent::EndStream {
            status,
            total_duration_ms,
        } => sse_event(
            "done",
            &json!({ "status": status, "duration_ms": total_duration_ms }),
        )
        .into_iter()
        .collect(),
    }
}

fn sse_event<T: Serialize>(name: &str, data: &T) -> Option<Event> {
    match Event::default().event(name).json_data(data) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(event = name, error = %e, "Dropping unserializable event");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
