//! Stepwise: math tutoring answer-routing service
//!
//! A question is routed through a sequence of guardrails that decides how it
//! is answered and how much the result can be trusted:
//!
//! - **Guardrails**: PII redaction before any further processing
//! - **Knowledge Base**: keyword-overlap search over curated, pre-verified
//!   question/solution records
//! - **Generator**: LLM collaborator producing structured step-by-step
//!   solutions from web-search context
//! - **Verifier**: independent numeric check of the model-claimed answer
//! - **Routing**: explicit state machine assembling the final result with
//!   route, confidence, and provenance metadata

pub mod config;
pub mod generator;
pub mod guardrails;
pub mod kb;
pub mod ratelimit;
pub mod routing;
pub mod search;
pub mod service;
pub mod storage;
pub mod types;
pub mod verifier;

// Re-export the core data model
pub use types::{
    Citation, Difficulty, GeneratorOutput, KbEntry, KbMatch, RouteDecision, SearchChunk,
    SolutionOutput,
};

// Re-export pipeline components
pub use generator::{GeneratorError, LlmGenerator, SolutionGenerator};
pub use kb::{KnowledgeStore, NoOpStore, StaticKb};
pub use ratelimit::{RateLimitExceeded, SlidingWindowLimiter};
pub use routing::{RoutingError, RoutingPipeline};
pub use search::{NoOpSearch, SearchProvider, TavilyClient};

// Re-export service entry points
pub use service::{create_app, AppContext};

// Re-export storage
pub use storage::{FeedbackRecord, FeedbackStore, Rating};
