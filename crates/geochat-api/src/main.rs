use clap::{Parser, Subcommand};
use geochat_persist::{Backend, BackendKind};
use std::sync::Arc;

use geochat_api::{
    app::{build_agent, build_router},
    cli,
    config::Settings,
    middleware::logging::init_logging,
    state::AppState,
    stats,
};

#[derive(Debug, Parser)]
#[command(name = "geochat", version, about = "Geographic chat agent over MCP tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API and the chat UI (default)
    Serve,
    /// Chat with the agent in the terminal
    Chat {
        /// Continue an existing thread
        #[arg(long)]
        thread_id: Option<String>,
    },
    /// Print every known thread id
    Threads,
    /// Print the stored messages of a thread
    Messages { thread_id: String },
    /// Write per-message usage statistics as CSV to stdout
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let command = Cli::parse().command.unwrap_or(Command::Serve);

    let settings = Settings::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(
        &settings.log_level,
        &settings.log_format,
        !matches!(command, Command::Serve),
    );

    // An ambiguous backend selection must stop the process before anything runs
    let kind = BackendKind::select(&settings.backend_settings())?;
    let backend = Backend::connect(kind, &settings.pool_settings()).await?;

    match command {
        Command::Serve => serve(settings, backend).await,
        Command::Chat { thread_id } => {
            let agent = build_agent(&settings, &backend).await?;
            cli::chat(agent, thread_id).await
        }
        Command::Threads => {
            let checkpointer = backend.checkpointer();
            cli::print_threads(checkpointer.as_ref(), &mut std::io::stdout()).await
        }
        Command::Messages { thread_id } => {
            cli::print_messages(backend.checkpointer(), &thread_id, &mut std::io::stdout()).await
        }
        Command::Stats => stats::write_stats(backend.checkpointer(), &mut std::io::stdout()).await,
    }
}

async fn serve(settings: Settings, backend: Backend) -> anyhow::Result<()> {
    tracing::info!("Starting geochat server");
    tracing::info!(model = %settings.model_name, backend = backend.name(), "Config loaded");

    let agent = build_agent(&settings, &backend).await?;
    let addr = settings.bind_addr();
    let chat_base = settings.chat_base();

    let state = Arc::new(AppState::new(settings, backend, agent));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Chat: http://{}{}/", addr, chat_base);

    axum::serve(listener, app).await?;

    Ok(())
}
