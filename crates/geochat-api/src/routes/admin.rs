use axum::{extract::State, Json};
use geochat_persist::list_thread_ids;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{auth::User, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadListResponse {
    pub status: String,
    pub thread_ids: Vec<String>,
}

/// Every known thread id, sorted and deduplicated
#[utoipa::path(
    get,
    path = "/admin/threads",
    responses(
        (status = 200, description = "Thread ids", body = ThreadListResponse)
    ),
    tag = "admin"
)]
pub async fn list_threads(State(state): State<Arc<AppState>>, user: User) -> Json<ThreadListResponse> {
    let checkpointer = state.backend.checkpointer();
    let thread_ids = list_thread_ids(checkpointer.as_ref()).await;
    tracing::debug!(user = %user.id, count = thread_ids.len(), "Listed threads");

    Json(ThreadListResponse {
        status: "ok".to_string(),
        thread_ids,
    })
}
