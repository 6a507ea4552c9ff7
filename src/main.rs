//! RoboClean support backend
//!
//! HTTP glue in front of a chat-completions provider: a streaming
//! support-chat endpoint with factsheet retrieval via tool calling, and a
//! follow-up suggestion endpoint.

mod api;
mod chat;
mod factsheet;
mod llm;
mod retrieval;
mod suggestions;
mod system_prompt;

use api::{create_router, AppState};
use factsheet::Factsheet;
use llm::{LlmConfig, LlmService, LoggingService, OpenAIService, DEFAULT_MODEL};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roboclean_support=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("ROBOCLEAN_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let factsheet_path = std::env::var("ROBOCLEAN_FACTSHEET")
        .unwrap_or_else(|_| "./roboclean_factsheet.pdf".to_string());

    // Load the factsheet once, before serving begins
    let factsheet = Arc::new(Factsheet::load(Path::new(&factsheet_path)));
    if factsheet.is_empty() {
        tracing::warn!(
            path = %factsheet_path,
            "Factsheet is empty; product lookups will find nothing"
        );
    }

    // Initialize the provider client
    let config = LlmConfig::from_env();
    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; provider calls will fail");
    }

    let service = OpenAIService::new(
        config.api_key.unwrap_or_default(),
        config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        config.base_url.as_deref(),
    );
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(service)));
    tracing::info!(model = %llm.model_id(), "LLM client initialized");

    // Create application state and router
    let state = AppState::new(llm, factsheet);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("RoboClean support server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
