use axum::Json;

use crate::auth::User;

/// Identity forwarded by the reverse proxy
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = User)
    ),
    tag = "identity"
)]
pub async fn me(user: User) -> Json<User> {
    Json(user)
}
