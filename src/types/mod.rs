//! Core data model for the answer-routing pipeline
//!
//! Shared types crossing module boundaries: knowledge-base records, web
//! search chunks, routing output, and the generator's structured result.

use serde::{Deserialize, Serialize};

// ============================================================================
// Knowledge Base
// ============================================================================

/// Difficulty tier assigned to a curated KB entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One curated question/solution record.
///
/// Loaded once at startup from the KB asset and never mutated afterwards.
/// `keywords` is the curated match vocabulary; entries without keywords can
/// never match a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbEntry {
    pub id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question: String,
    pub solution: String,
    pub verified: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A ranked match produced by the KB matcher for a single query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbMatch {
    pub id: String,
    pub question: String,
    pub solution: String,
    pub verified: bool,
    /// Keyword-overlap score in [0, 1], rounded to two decimals.
    pub score: f64,
}

// ============================================================================
// Web Search
// ============================================================================

/// One chunk of web-search context supplied per request.
///
/// `chunk_id` is unique within a single search response only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchChunk {
    pub url: String,
    pub chunk_id: String,
    pub text: String,
}

/// Citation metadata backing a web-routed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub chunk_id: String,
}

impl From<&SearchChunk> for Citation {
    fn from(chunk: &SearchChunk) -> Self {
        Self {
            url: chunk.url.clone(),
            chunk_id: chunk.chunk_id.clone(),
        }
    }
}

// ============================================================================
// Routing
// ============================================================================

/// The answer source the pipeline settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteDecision {
    /// At least one verified KB match covered the query.
    Kb,
    /// LLM-generated answer from web-search context.
    Web,
    /// The generator classified the query as not math-related.
    Blocked,
}

impl std::fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteDecision::Kb => write!(f, "kb"),
            RouteDecision::Web => write!(f, "web"),
            RouteDecision::Blocked => write!(f, "blocked"),
        }
    }
}

/// Final pipeline result, produced fresh per request and never mutated.
///
/// `is_verified` is only meaningful when `route_decision` is `Kb` or `Web`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionOutput {
    pub is_math_question: bool,
    pub step_by_step_solution: String,
    pub route_decision: RouteDecision,
    /// IDs of every KB hit in ranked order (kb route only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_hit_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    /// Confidence in [0, 1]: top KB score on the kb route, a fixed
    /// heuristic on the web route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// All chunks supplied to the generator, cited or not (web route only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Vec<Citation>>,
}

// ============================================================================
// Generator
// ============================================================================

/// Structured generator result: the model either solved a math question or
/// declined with a fallback message.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorOutput {
    /// The model classified the query as math and produced a solution.
    Classified {
        /// "Step N: ..." blocks followed by a "Final Answer:" line.
        steps: String,
        /// Canonical final-answer expression for verification, e.g. "x = 6".
        final_expression: Option<String>,
        /// Claimed numeric value of the final answer.
        final_numeric: Option<f64>,
    },
    /// The model declined a non-math query.
    NotMath {
        /// Polite fallback message shown to the user.
        message: String,
    },
}
