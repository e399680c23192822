use axum::Json;
use utoipa::OpenApi;

use crate::{
    auth::User,
    render::{DisplayKind, DisplayRecord, DisplayRole},
    routes::{
        admin::{self, ThreadListResponse},
        chat::{self, HistoryResponse, NewThreadResponse, SendMessageRequest},
        health::{self, HealthResponse},
        identity,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::db_health,
        identity::me,
        admin::list_threads,
        chat::new_thread,
        chat::history,
        chat::send_message,
    ),
    components(schemas(
        HealthResponse,
        User,
        ThreadListResponse,
        NewThreadResponse,
        HistoryResponse,
        SendMessageRequest,
        DisplayRecord,
        DisplayRole,
        DisplayKind,
    )),
    tags(
        (name = "health", description = "Liveness and database probes"),
        (name = "identity", description = "Proxy-forwarded identity"),
        (name = "admin", description = "Thread administration"),
        (name = "chat", description = "Chat endpoints, mounted under chat_path"),
    )
)]
pub struct ApiDoc;

/// OpenAPI document of the HTTP surface
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
