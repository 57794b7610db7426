use std::sync::Arc;

use crate::config::Config;
use crate::interview::store::SessionStore;
use crate::llm_client::CompletionService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Completion backend. `LlmClient` in production, scripted fakes in tests.
    pub llm: Arc<dyn CompletionService>,
    pub sessions: SessionStore,
    pub config: Config,
}
