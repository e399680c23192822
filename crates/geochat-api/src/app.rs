use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use geochat_graph::{Agent, AgentConfig};
use geochat_llm::ClientFactory;
use geochat_mcp::{CreateMapTool, MCPClient, MCPToolExecutor};
use geochat_persist::Backend;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Settings,
    middleware::logging,
    routes::{admin, chat, health, identity, openapi, view},
    state::AppState,
};

/// Wire the model client, the tool server and the checkpointer into an agent.
///
/// A missing API key is fatal; an unavailable tool server is not, the agent
/// then only offers the local map tool.
pub async fn build_agent(settings: &Settings, backend: &Backend) -> anyhow::Result<Agent> {
    let spec = settings.model_spec()?;
    let client = ClientFactory::create_chat_client(&spec, &settings.provider_keys())?;

    let executor = MCPToolExecutor::new();
    executor.add_local_tool(CreateMapTool).await;

    if settings.mcp_enabled {
        let server = settings.tool_server();
        tracing::info!(command = %server.command, args = ?server.args, "Starting tool server");
        match MCPClient::new_stdio(server).await {
            Ok(client) => {
                tracing::info!(server = client.name(), tools = client.list_tools().len(), "Tool server connected");
                executor.add_server(client).await;
            }
            Err(e) => tracing::warn!(error = %e, "Tool server unavailable, continuing without it"),
        }
    }

    let mut config = AgentConfig::new(spec.model.clone()).with_max_iterations(settings.max_iterations);
    if let Some(temperature) = settings.temperature {
        config = config.with_temperature(temperature);
    }
    if let Some(prompt) = settings.system_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
        config = config.with_system_prompt(prompt);
    }

    Agent::builder()
        .chat_client(client)
        .tools(Arc::new(executor))
        .checkpointer(backend.checkpointer())
        .config(config)
        .build()
        .await
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let settings = Arc::clone(&state.settings);
    let chat_base = settings.chat_base();
    let view_base = settings.view_base();

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/health/db", get(health::db_health))
        // Identity & admin
        .route("/me", get(identity::me))
        .route("/admin/threads", get(admin::list_threads))
        .route("/api/openapi.json", get(openapi::openapi_json))
        // Chat UI
        .route(&page_path(&chat_base), get(chat::chat_page))
        .route(&format!("{}/api/threads", chat_base), post(chat::new_thread))
        .route(&format!("{}/api/history", chat_base), get(chat::history))
        .route(&format!("{}/api/messages", chat_base), post(chat::send_message))
        .route(&page_path(&view_base), get(view::view_page))
        // Front-end assets
        .nest_service("/front", ServeDir::new(&settings.front_dir))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(settings.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&settings))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn page_path(base: &str) -> String {
    if base.is_empty() {
        "/".to_string()
    } else {
        base.to_string()
    }
}

pub fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins = settings.cors_origin_list();
    if origins.is_empty() {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        cors.allow_origin(parsed)
    }
}
