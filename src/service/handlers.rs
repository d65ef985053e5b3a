//! Request handlers for the tutoring API
//!
//! The solve handler is the single pipeline entry point: rate limit first
//! (the pipeline is never touched on rejection), then web search, then the
//! routing pipeline. Refine and feedback are independent single-shot
//! operations.

use super::envelope::{ApiErrorResponse, ApiResponse};
use super::AppContext;
use crate::storage::{FeedbackRecord, Rating};
use crate::types::{RouteDecision, SolutionOutput};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Caller identity used when no forwarding header is present.
const GLOBAL_IDENTITY: &str = "global";

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SolveRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SolveResponse {
    /// Rendered solution text including the routing footer.
    pub solution: String,
    pub is_math_question: bool,
    /// Full structured pipeline output.
    pub output: SolutionOutput,
}

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub question: String,
    pub original_solution: String,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub solution: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub question: String,
    pub solution: String,
    pub rating: Rating,
    #[serde(default)]
    pub feedback_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub kb_store: &'static str,
    pub kb_entries: usize,
    pub feedback_records: usize,
}

/// Caller identity for rate limiting: first forwarded address when behind a
/// proxy, else a fixed shared key.
fn caller_identity(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| GLOBAL_IDENTITY.to_string())
}

/// Routing footer appended to math answers, mirroring what the chat UI
/// displays under each solution.
fn render_solution(output: &SolutionOutput) -> String {
    let mut text = output.step_by_step_solution.clone();
    if output.is_math_question {
        let verified = match output.is_verified {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unchecked",
        };
        let confidence = output
            .confidence
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "N/A".to_string());
        text.push_str(&format!(
            "\n\n---\nRoute: {} | Verified: {} | Confidence: {}",
            output.route_decision, verified, confidence
        ));
        if output.route_decision == RouteDecision::Kb {
            if let Some(ids) = &output.kb_hit_ids {
                text.push_str(&format!(" | KB Hits: {}", ids.join(", ")));
            }
        }
    }
    text
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/solve — run one question through the routing pipeline.
pub async fn solve(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(request): Json<SolveRequest>,
) -> Response {
    if request.question.trim().is_empty() {
        return ApiErrorResponse::bad_request("Please enter a question.");
    }

    let identity = caller_identity(&headers);
    if ctx.limiter.check(&identity).is_err() {
        info!(identity, "rate limit exceeded");
        return ApiErrorResponse::rate_limited(
            "You have made too many requests. Please wait a moment and try again.",
        );
    }

    // Redact before the question leaves the process; the pipeline applies
    // the same rules again, which is a no-op on already-redacted text.
    let question = crate::guardrails::redact(&request.question).text;

    // Search context is collected here, outside the pipeline.
    let chunks = ctx.search.search(&question).await;

    match ctx.pipeline.resolve(&question, &chunks).await {
        Ok(output) => {
            info!(
                route = %output.route_decision,
                verified = ?output.is_verified,
                "pipeline resolved"
            );
            ApiResponse::ok(SolveResponse {
                solution: render_solution(&output),
                is_math_question: output.is_math_question,
                output,
            })
        }
        Err(e) => {
            error!(error = %e, "pipeline failed");
            ApiErrorResponse::generation_failed("Failed to generate a solution. Please try again.")
        }
    }
}

/// POST /api/v1/refine — revise a prior solution from free-text feedback.
pub async fn refine(
    State(ctx): State<AppContext>,
    Json(request): Json<RefineRequest>,
) -> Response {
    if request.feedback.trim().is_empty() {
        return ApiErrorResponse::bad_request("Please provide some feedback.");
    }

    match ctx
        .generator
        .refine(
            &request.question,
            &request.original_solution,
            &request.feedback,
        )
        .await
    {
        Ok(solution) => ApiResponse::ok(RefineResponse { solution }),
        Err(e) => {
            error!(error = %e, "refine failed");
            ApiErrorResponse::generation_failed("Failed to refine the solution. Please try again.")
        }
    }
}

/// POST /api/v1/feedback — persist a rating for a displayed solution.
pub async fn save_feedback(
    State(ctx): State<AppContext>,
    Json(request): Json<FeedbackRequest>,
) -> Response {
    let record = FeedbackRecord::new(
        request.question,
        request.solution,
        request.rating,
        request.feedback_text,
    );

    match ctx.feedback.persist(&record) {
        Ok(()) => {
            info!(rating = ?record.rating, "feedback recorded");
            ApiResponse::ok(FeedbackResponse { success: true })
        }
        Err(e) => {
            error!(error = %e, "failed to save feedback");
            ApiErrorResponse::internal("An error occurred while saving your feedback.")
        }
    }
}

/// GET /api/v1/health — component health summary.
pub async fn health(State(ctx): State<AppContext>) -> Response {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        kb_store: ctx.kb.store_name(),
        kb_entries: ctx.kb.entry_count(),
        feedback_records: ctx.feedback.count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Citation;

    fn output(route: RouteDecision) -> SolutionOutput {
        SolutionOutput {
            is_math_question: true,
            step_by_step_solution: "Step 1: add.\nFinal Answer: 4".to_string(),
            route_decision: route,
            kb_hit_ids: None,
            is_verified: Some(true),
            confidence: Some(0.8),
            provenance: Some(vec![Citation {
                url: "https://a.example".to_string(),
                chunk_id: "web-1".to_string(),
            }]),
        }
    }

    #[test]
    fn test_render_web_footer() {
        let text = render_solution(&output(RouteDecision::Web));
        assert!(text.contains("Route: web | Verified: yes | Confidence: 0.80"));
        assert!(!text.contains("KB Hits"));
    }

    #[test]
    fn test_render_kb_footer_lists_hits() {
        let mut out = output(RouteDecision::Kb);
        out.kb_hit_ids = Some(vec!["alg-001".to_string(), "alg-002".to_string()]);
        out.confidence = Some(1.0);
        let text = render_solution(&out);
        assert!(text.contains("Route: kb"));
        assert!(text.contains("KB Hits: alg-001, alg-002"));
    }

    #[test]
    fn test_render_blocked_has_no_footer() {
        let out = SolutionOutput {
            is_math_question: false,
            step_by_step_solution: "I can only answer math questions.".to_string(),
            route_decision: RouteDecision::Blocked,
            kb_hit_ids: None,
            is_verified: None,
            confidence: None,
            provenance: None,
        };
        let text = render_solution(&out);
        assert_eq!(text, "I can only answer math questions.");
    }

    #[test]
    fn test_caller_identity_from_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(caller_identity(&headers), "203.0.113.7");
    }

    #[test]
    fn test_caller_identity_defaults_to_global() {
        assert_eq!(caller_identity(&HeaderMap::new()), "global");
    }
}
