use crate::config::Settings;
use geochat_graph::Agent;
use geochat_persist::Backend;
use std::sync::Arc;

/// Shared application state passed to all handlers
///
/// The agent and the backend are built once at startup and shared; the
/// agent's checkpointer is the backend's.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub backend: Backend,
    pub agent: Agent,
}

impl AppState {
    pub fn new(settings: Settings, backend: Backend, agent: Agent) -> Self {
        Self {
            settings: Arc::new(settings),
            backend,
            agent,
        }
    }
}
