use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextModel;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Scores resume/JD compatibility. Default: Groq chat completions.
    pub analyst: Arc<dyn TextModel>,
    /// Rewrites the resume. Default: Gemini `generateContent`.
    pub writer: Arc<dyn TextModel>,
    pub sessions: SessionStore,
    pub config: Config,
}
