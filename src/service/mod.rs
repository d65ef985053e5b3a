//! REST API module using Axum
//!
//! HTTP surface of the tutoring service:
//! - `POST /api/v1/solve` — pipeline entry point (rate limited)
//! - `POST /api/v1/refine` — single-shot solution revision
//! - `POST /api/v1/feedback` — rating persistence
//! - `GET  /api/v1/health` — component health
//!
//! All shared collaborators live in [`AppContext`], injected as axum state:
//! the context is built once at startup and cloned per request.

pub mod envelope;
pub mod handlers;

use crate::generator::SolutionGenerator;
use crate::kb::KnowledgeStore;
use crate::ratelimit::SlidingWindowLimiter;
use crate::routing::RoutingPipeline;
use crate::search::SearchProvider;
use crate::storage::FeedbackStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application context: the explicit object that replaces global
/// mutable process state. Immutable after startup except the rate-limit
/// window map, which is internally synchronized.
#[derive(Clone)]
pub struct AppContext {
    pub pipeline: RoutingPipeline,
    pub kb: Arc<dyn KnowledgeStore>,
    pub generator: Arc<dyn SolutionGenerator>,
    pub search: Arc<dyn SearchProvider>,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub feedback: FeedbackStore,
}

impl AppContext {
    pub fn new(
        kb: Arc<dyn KnowledgeStore>,
        generator: Arc<dyn SolutionGenerator>,
        search: Arc<dyn SearchProvider>,
        limiter: Arc<SlidingWindowLimiter>,
        feedback: FeedbackStore,
    ) -> Self {
        Self {
            pipeline: RoutingPipeline::new(Arc::clone(&kb), Arc::clone(&generator)),
            kb,
            generator,
            search,
            limiter,
            feedback,
        }
    }
}

/// Build the full application router.
pub fn create_app(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/v1/solve", post(handlers::solve))
        .route("/api/v1/refine", post(handlers::refine))
        .route("/api/v1/feedback", post(handlers::save_feedback))
        .route("/api/v1/health", get(handlers::health))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
