//! Stepwise server binary
//!
//! Serves the math-tutoring answer-routing API.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (KB at data/kb.json, Ollama at localhost:11434)
//! cargo run --release
//!
//! # Override the bind address and KB asset
//! cargo run --release -- --addr 0.0.0.0:9090 --kb fixtures/kb.json
//! ```
//!
//! # Environment Variables
//!
//! - `STEPWISE_CONFIG`: path to a TOML config file
//! - `TAVILY_API_KEY`: web-search credentials (absent = empty search results)
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use stepwise::config::AppConfig;
use stepwise::ratelimit::SlidingWindowLimiter;
use stepwise::service::{create_app, AppContext};
use stepwise::storage::FeedbackStore;
use stepwise::{KnowledgeStore, LlmGenerator, TavilyClient};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "stepwise")]
#[command(about = "Stepwise math tutoring answer-routing service")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to a TOML config file (overrides STEPWISE_CONFIG)
    #[arg(long)]
    config: Option<String>,

    /// Path to the knowledge-base JSON asset
    #[arg(long)]
    kb: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Collaborator API keys may live in a local .env file.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("failed to load config")?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(kb_path) = args.kb {
        config.kb.path = kb_path;
    }

    let kb = stepwise::kb::load_from_file(&config.kb.path)
        .with_context(|| format!("failed to load KB from {}", config.kb.path))?;
    info!(entries = kb.entry_count(), path = %config.kb.path, "knowledge base loaded");

    let generator = Arc::new(LlmGenerator::new(
        &config.llm.base_url,
        &config.llm.model,
        config.llm.timeout_secs,
    ));
    let search = Arc::new(TavilyClient::new(
        &config.search.base_url,
        config.search.max_results,
        config.search.timeout_secs,
    ));
    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
    ));
    let feedback = FeedbackStore::open(&config.kb.feedback_db)
        .with_context(|| format!("failed to open feedback store at {}", config.kb.feedback_db))?;

    let ctx = AppContext::new(Arc::new(kb), generator, search, limiter, feedback);
    let app = create_app(ctx);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, model = %config.llm.model, "stepwise listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
