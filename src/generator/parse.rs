//! Schema validation for model output
//!
//! The model is instructed to append one JSON object matching the solution
//! schema. Real models wrap it in code fences, prepend reasoning in
//! `<think>` blocks, or interleave prose, so extraction is lenient; the
//! schema check itself is strict.

use super::{GeneratorError, NOT_MATH_FALLBACK};
use crate::types::GeneratorOutput;
use serde::Deserialize;

/// Wire schema the model must satisfy.
#[derive(Debug, Deserialize)]
struct RawSolution {
    is_math_question: bool,
    step_by_step_solution: String,
    #[serde(default)]
    final_answer_expression: Option<String>,
    #[serde(default)]
    final_answer_numeric: Option<f64>,
}

/// Strip reasoning-model `<think>...</think>` blocks from a response.
///
/// Unclosed tags drop everything from the tag onward.
pub fn strip_reasoning(text: &str) -> String {
    let lower = text.to_lowercase();
    if let Some(end) = lower.find("</think>") {
        return text[end + "</think>".len()..].trim().to_string();
    }
    if let Some(start) = lower.find("<think>") {
        return text[..start].trim().to_string();
    }
    text.trim().to_string()
}

/// Locate the JSON object in the (possibly fenced, possibly chatty) response.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse a raw model response into the structured generator output.
///
/// Fails with [`GeneratorError::Format`] when no JSON object is present or
/// the object does not satisfy the schema.
pub fn parse_solution_output(raw: &str) -> Result<GeneratorOutput, GeneratorError> {
    let cleaned = strip_reasoning(raw);
    let json = extract_json(&cleaned)
        .ok_or_else(|| GeneratorError::Format("no JSON object in model output".to_string()))?;

    let parsed: RawSolution =
        serde_json::from_str(json).map_err(|e| GeneratorError::Format(e.to_string()))?;

    if !parsed.is_math_question {
        let message = if parsed.step_by_step_solution.trim().is_empty() {
            NOT_MATH_FALLBACK.to_string()
        } else {
            parsed.step_by_step_solution
        };
        return Ok(GeneratorOutput::NotMath { message });
    }

    if parsed.step_by_step_solution.trim().is_empty() {
        return Err(GeneratorError::Format(
            "math question with empty solution".to_string(),
        ));
    }

    Ok(GeneratorOutput::Classified {
        steps: parsed.step_by_step_solution,
        final_expression: parsed.final_answer_expression,
        final_numeric: parsed.final_answer_numeric,
    })
}
