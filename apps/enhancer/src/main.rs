use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use enhancer::config::Config;
use enhancer::llm_client::{GeminiClient, GroqClient, TextModel};
use enhancer::routes::build_router;
use enhancer::session::SessionStore;
use enhancer::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing API keys)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Enhancer v{}", env!("CARGO_PKG_VERSION"));

    // Analysis runs on Groq, rewriting on Gemini
    let analyst = GroqClient::new(config.groq_api_key.clone())?
        .with_base_url(config.groq_base_url.as_str())
        .with_model(config.groq_model.as_str());
    let writer = GeminiClient::new(config.gemini_api_key.clone())?
        .with_base_url(config.gemini_base_url.as_str())
        .with_model(config.gemini_model.as_str());
    info!(
        "LLM clients initialized (analysis: {}, rewrite: {})",
        analyst.model_name(),
        writer.model_name()
    );

    let state = AppState {
        analyst: Arc::new(analyst),
        writer: Arc::new(writer),
        sessions: SessionStore::new(config.session_ttl_secs),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
