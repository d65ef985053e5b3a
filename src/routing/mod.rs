//! Routing orchestrator
//!
//! Sequences the guardrails into one decision pipeline:
//!
//! ```text
//! START -> REDACT -> KB_LOOKUP -> KB_HIT                    (terminal)
//!                              -> LLM_GENERATE -> BLOCKED   (terminal)
//!                                              -> VERIFY -> WEB_RESULT (terminal)
//!                                              ----------> WEB_RESULT (terminal)
//! ```
//!
//! Implemented as an explicit state machine rather than nested conditionals
//! so each transition is independently checkable. The pipeline is
//! request-scoped and stateless between requests; the KB snapshot and the
//! generator are shared read-only collaborators.

use crate::generator::{GeneratorError, SolutionGenerator};
use crate::guardrails;
use crate::kb::KnowledgeStore;
use crate::types::{Citation, GeneratorOutput, KbMatch, RouteDecision, SearchChunk, SolutionOutput};
use crate::verifier;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Fixed heuristic confidence attached to web-routed answers.
pub const WEB_CONFIDENCE: f64 = 0.8;

/// Errors that abort the pipeline.
///
/// Only generation failures abort; verification and search failures degrade
/// inside the pipeline instead.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error(transparent)]
    Generation(#[from] GeneratorError),
}

/// Pipeline states. Terminal states carry everything needed to assemble the
/// final [`SolutionOutput`].
#[derive(Debug)]
enum RouteState {
    Start,
    Redact,
    KbLookup { query: String },
    KbHit { matches: Vec<KbMatch> },
    LlmGenerate { query: String },
    Blocked { message: String },
    Verify {
        steps: String,
        expression: String,
        numeric: f64,
    },
    WebResult {
        steps: String,
        is_verified: Option<bool>,
    },
}

/// The answer-routing pipeline. Cheap to clone; collaborators are shared.
#[derive(Clone)]
pub struct RoutingPipeline {
    kb: Arc<dyn KnowledgeStore>,
    generator: Arc<dyn SolutionGenerator>,
}

impl RoutingPipeline {
    pub fn new(kb: Arc<dyn KnowledgeStore>, generator: Arc<dyn SolutionGenerator>) -> Self {
        Self { kb, generator }
    }

    /// Run one question through the full pipeline.
    ///
    /// `search_results` are collected by the caller (the pipeline performs
    /// no fan-out of its own) and become the provenance of any web-routed
    /// answer.
    pub async fn resolve(
        &self,
        question: &str,
        search_results: &[SearchChunk],
    ) -> Result<SolutionOutput, RoutingError> {
        let mut state = RouteState::Start;
        loop {
            state = match state {
                RouteState::Start => RouteState::Redact,

                RouteState::Redact => {
                    // Always non-failing; the redacted text becomes the
                    // lookup key for everything downstream.
                    let redaction = guardrails::redact(question);
                    RouteState::KbLookup {
                        query: redaction.text,
                    }
                }

                RouteState::KbLookup { query } => {
                    let matches = self.kb.search(&query);
                    if matches.is_empty() {
                        info!(store = self.kb.store_name(), "KB miss, generating");
                        RouteState::LlmGenerate { query }
                    } else {
                        info!(top = %matches[0].id, hits = matches.len(), "KB hit");
                        RouteState::KbHit { matches }
                    }
                }

                RouteState::KbHit { matches } => return Ok(kb_output(&matches)),

                RouteState::LlmGenerate { query } => {
                    match self.generator.generate(&query, search_results).await? {
                        GeneratorOutput::NotMath { message } => RouteState::Blocked { message },
                        GeneratorOutput::Classified {
                            steps,
                            final_expression: Some(expression),
                            final_numeric: Some(numeric),
                        } => RouteState::Verify {
                            steps,
                            expression,
                            numeric,
                        },
                        // Without both extraction fields there is nothing to
                        // verify; is_verified stays undefined.
                        GeneratorOutput::Classified { steps, .. } => RouteState::WebResult {
                            steps,
                            is_verified: None,
                        },
                    }
                }

                RouteState::Blocked { message } => return Ok(blocked_output(message)),

                RouteState::Verify {
                    steps,
                    expression,
                    numeric,
                } => {
                    // verify() already collapses every evaluation error to
                    // false; the pipeline never aborts here.
                    let verified = verifier::verify(&expression, numeric);
                    RouteState::WebResult {
                        steps,
                        is_verified: Some(verified),
                    }
                }

                RouteState::WebResult { steps, is_verified } => {
                    return Ok(web_output(steps, is_verified, search_results))
                }
            };
        }
    }
}

/// KB_HIT terminal: top-ranked solution, verified flag copied (not
/// re-verified), confidence = top score, all hit ids in ranked order.
fn kb_output(matches: &[KbMatch]) -> SolutionOutput {
    let top = &matches[0];
    SolutionOutput {
        is_math_question: true,
        step_by_step_solution: top.solution.clone(),
        route_decision: RouteDecision::Kb,
        kb_hit_ids: Some(matches.iter().map(|m| m.id.clone()).collect()),
        is_verified: Some(top.verified),
        confidence: Some(top.score),
        provenance: None,
    }
}

/// BLOCKED terminal: no verification, no provenance.
fn blocked_output(message: String) -> SolutionOutput {
    SolutionOutput {
        is_math_question: false,
        step_by_step_solution: message,
        route_decision: RouteDecision::Blocked,
        kb_hit_ids: None,
        is_verified: None,
        confidence: None,
        provenance: None,
    }
}

/// WEB_RESULT terminal: provenance covers every supplied chunk, cited or not.
fn web_output(
    steps: String,
    is_verified: Option<bool>,
    search_results: &[SearchChunk],
) -> SolutionOutput {
    SolutionOutput {
        is_math_question: true,
        step_by_step_solution: steps,
        route_decision: RouteDecision::Web,
        kb_hit_ids: None,
        is_verified,
        confidence: Some(WEB_CONFIDENCE),
        provenance: Some(search_results.iter().map(Citation::from).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorError;
    use crate::kb::{NoOpStore, StaticKb};
    use crate::types::{Difficulty, KbEntry};
    use async_trait::async_trait;

    /// Generator stub returning a canned output (or error).
    struct StubGenerator {
        output: Option<GeneratorOutput>,
    }

    #[async_trait]
    impl SolutionGenerator for StubGenerator {
        async fn generate(
            &self,
            _query: &str,
            _search_results: &[SearchChunk],
        ) -> Result<GeneratorOutput, GeneratorError> {
            self.output
                .clone()
                .ok_or_else(|| GeneratorError::Format("stub failure".to_string()))
        }

        async fn refine(
            &self,
            _question: &str,
            _original_solution: &str,
            _feedback: &str,
        ) -> Result<String, GeneratorError> {
            Ok("refined".to_string())
        }
    }

    fn kb_with_entry() -> Arc<StaticKb> {
        Arc::new(StaticKb::from_entries(vec![KbEntry {
            id: "alg-001".to_string(),
            topic: "algebra".to_string(),
            difficulty: Difficulty::Easy,
            question: "Solve the quadratic equation".to_string(),
            solution: "Step 1: factor.\nFinal Answer: x = 2".to_string(),
            verified: true,
            keywords: vec!["quadratic".to_string(), "equation".to_string()],
        }]))
    }

    fn classified(expr: Option<&str>, numeric: Option<f64>) -> GeneratorOutput {
        GeneratorOutput::Classified {
            steps: "Step 1: compute.\nFinal Answer: 4".to_string(),
            final_expression: expr.map(str::to_string),
            final_numeric: numeric,
        }
    }

    #[tokio::test]
    async fn test_kb_hit_short_circuits_generator() {
        // Stub would error if called; a KB hit must never reach it.
        let pipeline = RoutingPipeline::new(
            kb_with_entry(),
            Arc::new(StubGenerator { output: None }),
        );
        let output = pipeline.resolve("quadratic equation", &[]).await.unwrap();
        assert_eq!(output.route_decision, RouteDecision::Kb);
        assert_eq!(output.kb_hit_ids, Some(vec!["alg-001".to_string()]));
        // Copied from the stored entry, not re-verified.
        assert_eq!(output.is_verified, Some(true));
        assert_eq!(output.confidence, Some(1.0));
        assert!(output.provenance.is_none());
    }

    #[tokio::test]
    async fn test_blocked_route() {
        let pipeline = RoutingPipeline::new(
            Arc::new(NoOpStore),
            Arc::new(StubGenerator {
                output: Some(GeneratorOutput::NotMath {
                    message: "I can only answer math questions.".to_string(),
                }),
            }),
        );
        let output = pipeline.resolve("write me a poem", &[]).await.unwrap();
        assert_eq!(output.route_decision, RouteDecision::Blocked);
        assert!(!output.is_math_question);
        assert!(output.is_verified.is_none());
        assert!(output.provenance.is_none());
        assert!(output.confidence.is_none());
    }

    #[tokio::test]
    async fn test_web_route_with_successful_verification() {
        let chunks = vec![SearchChunk {
            url: "https://math.example".to_string(),
            chunk_id: "web-1".to_string(),
            text: "2+2 is 4".to_string(),
        }];
        let pipeline = RoutingPipeline::new(
            Arc::new(NoOpStore),
            Arc::new(StubGenerator {
                output: Some(classified(Some("4"), Some(4.0))),
            }),
        );
        let output = pipeline.resolve("What is 2+2?", &chunks).await.unwrap();
        assert_eq!(output.route_decision, RouteDecision::Web);
        assert_eq!(output.is_verified, Some(true));
        assert_eq!(output.confidence, Some(WEB_CONFIDENCE));
        let provenance = output.provenance.unwrap();
        assert_eq!(provenance.len(), 1);
        assert_eq!(provenance[0].chunk_id, "web-1");
    }

    #[tokio::test]
    async fn test_web_route_failed_verification_downgrades() {
        let pipeline = RoutingPipeline::new(
            Arc::new(NoOpStore),
            Arc::new(StubGenerator {
                output: Some(classified(Some("not-an-expr"), Some(5.0))),
            }),
        );
        let output = pipeline.resolve("hard question", &[]).await.unwrap();
        assert_eq!(output.route_decision, RouteDecision::Web);
        assert_eq!(output.is_verified, Some(false));
    }

    #[tokio::test]
    async fn test_missing_extraction_skips_verify() {
        let pipeline = RoutingPipeline::new(
            Arc::new(NoOpStore),
            Arc::new(StubGenerator {
                output: Some(classified(None, None)),
            }),
        );
        let output = pipeline.resolve("question", &[]).await.unwrap();
        assert_eq!(output.route_decision, RouteDecision::Web);
        assert!(output.is_verified.is_none());
    }

    #[tokio::test]
    async fn test_expression_without_numeric_skips_verify() {
        let pipeline = RoutingPipeline::new(
            Arc::new(NoOpStore),
            Arc::new(StubGenerator {
                output: Some(classified(Some("x = 6"), None)),
            }),
        );
        let output = pipeline.resolve("question", &[]).await.unwrap();
        assert!(output.is_verified.is_none());
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let pipeline = RoutingPipeline::new(
            Arc::new(NoOpStore),
            Arc::new(StubGenerator { output: None }),
        );
        let err = pipeline.resolve("question", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            RoutingError::Generation(GeneratorError::Format(_))
        ));
    }

    #[tokio::test]
    async fn test_redaction_feeds_kb_lookup() {
        // The PII-laden query still matches on its non-PII tokens.
        let pipeline = RoutingPipeline::new(
            kb_with_entry(),
            Arc::new(StubGenerator { output: None }),
        );
        let output = pipeline
            .resolve("quadratic equation a@b.com", &[])
            .await
            .unwrap();
        assert_eq!(output.route_decision, RouteDecision::Kb);
    }
}
