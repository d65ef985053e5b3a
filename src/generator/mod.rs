//! Solution generator: LLM collaborator for classification and solving
//!
//! Delegates math classification and step-by-step solving to a chat-completion
//! model behind an Ollama-compatible endpoint. The component owns no routing
//! logic of its own; it builds the fixed instruction template, enforces the
//! structured output schema, and retries one format failure before surfacing
//! it.

mod parse;
mod prompt;

pub use parse::parse_solution_output;

use crate::types::{GeneratorOutput, SearchChunk};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fallback shown when the model declines without supplying its own message.
pub const NOT_MATH_FALLBACK: &str =
    "I can only answer math-related questions. Please ask something else.";

/// Errors from the generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The model's output could not be parsed into the expected schema,
    /// even after one internal retry.
    #[error("model output did not match the expected schema: {0}")]
    Format(String),

    /// Transport-level failure talking to the model endpoint.
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The bounded call window elapsed.
    #[error("model call timed out after {0} seconds")]
    Timeout(u64),

    /// The endpoint answered with a non-success status.
    #[error("model endpoint returned status {0}")]
    Upstream(reqwest::StatusCode),
}

/// Trait for solution-generating collaborators.
#[async_trait]
pub trait SolutionGenerator: Send + Sync {
    /// Classify and solve `query` using the supplied search context.
    async fn generate(
        &self,
        query: &str,
        search_results: &[SearchChunk],
    ) -> Result<GeneratorOutput, GeneratorError>;

    /// Revise a prior solution given free-text feedback. Independent of the
    /// routing pipeline.
    async fn refine(
        &self,
        question: &str,
        original_solution: &str,
        feedback: &str,
    ) -> Result<String, GeneratorError>;
}

// ============================================================================
// Ollama-compatible chat client
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Generator backed by an Ollama-compatible `/api/chat` endpoint.
pub struct LlmGenerator {
    http: reqwest::Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

impl LlmGenerator {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout_secs,
        }
    }

    /// One chat round-trip, bounded by the configured timeout.
    async fn chat(&self, system: &str, user: &str) -> Result<String, GeneratorError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
        };

        let send = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send();

        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), send)
            .await
            .map_err(|_| GeneratorError::Timeout(self.timeout_secs))??;

        if !response.status().is_success() {
            return Err(GeneratorError::Upstream(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.message.content)
    }
}

#[async_trait]
impl SolutionGenerator for LlmGenerator {
    async fn generate(
        &self,
        query: &str,
        search_results: &[SearchChunk],
    ) -> Result<GeneratorOutput, GeneratorError> {
        let user_prompt = prompt::solution_prompt(query, search_results);

        // One internal retry on a format failure: small models occasionally
        // drop the JSON block on the first attempt.
        let mut last_err = None;
        for attempt in 1..=2 {
            let raw = self.chat(prompt::SOLUTION_SYSTEM, &user_prompt).await?;
            debug!(attempt, raw_len = raw.len(), "model response received");
            match parse_solution_output(&raw) {
                Ok(output) => {
                    info!(attempt, "generator produced structured output");
                    return Ok(output);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "model output failed schema validation");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| GeneratorError::Format("empty response".to_string())))
    }

    async fn refine(
        &self,
        question: &str,
        original_solution: &str,
        feedback: &str,
    ) -> Result<String, GeneratorError> {
        let user_prompt = prompt::refine_prompt(question, original_solution, feedback);
        let raw = self.chat(prompt::REFINE_SYSTEM, &user_prompt).await?;
        let refined = parse::strip_reasoning(&raw).trim().to_string();
        if refined.is_empty() {
            return Err(GeneratorError::Format(
                "refine call returned an empty solution".to_string(),
            ));
        }
        Ok(refined)
    }
}
