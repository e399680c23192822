pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod render;
pub mod routes;
pub mod state;
pub mod stats;

pub use app::{build_agent, build_cors_layer, build_router};
pub use auth::User;
pub use config::Settings;
pub use error::{ApiError, ApiResult};
pub use render::{render, DisplayKind, DisplayRecord, DisplayRole, Rendered};
pub use state::AppState;
