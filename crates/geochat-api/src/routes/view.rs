use axum::{
    extract::{Query, State},
    response::Html,
};
use std::sync::Arc;

use crate::{error::ApiResult, pages, routes::chat::{load_records, HistoryQuery}, state::AppState};

/// Read-only page of a thread
pub async fn view_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Html<String>> {
    let thread_id = query
        .thread_id
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let page = match thread_id {
        Some(thread_id) => {
            let records = load_records(&state.agent, &thread_id).await?;
            pages::view_page(Some(&thread_id), &records)
        }
        None => pages::view_page(None, &[]),
    };

    Ok(Html(page))
}
