//! Fixed instruction templates for the tutoring model
//!
//! The solution template pins down both the human-readable format
//! ("Step N: ..." blocks, then a "Final Answer:" line, with chunk citations)
//! and the machine-readable JSON block the parser validates.

use crate::types::SearchChunk;
use std::fmt::Write as _;

pub const SOLUTION_SYSTEM: &str = "\
You are a Mathematics Teaching Assistant.
First, determine if the user's query is a math-related question based on the query and the search results.

If it is a math question, solve the problem step-by-step in a structured way.
Use the web search results to help you formulate the answer and cite the sources you use.
Format the solution exactly like this:

Step 1: [first step explanation]
[calculation/work shown]

Step 2: [second step explanation]
[calculation/work shown]

... continue until the final result.

Finally, write:
Final Answer: [result]

If the query is not a math question, provide a polite response indicating that you can only answer math-related questions.

After your answer, output exactly one JSON object on its own lines:
{
  \"is_math_question\": true or false,
  \"step_by_step_solution\": \"the full formatted solution (or the polite refusal)\",
  \"final_answer_expression\": \"the final mathematical expression, e.g. 'x = 6' or '12/4' (omit if not math)\",
  \"final_answer_numeric\": the numeric value of the final answer (omit if not math)
}";

pub const REFINE_SYSTEM: &str = "\
You are an expert math tutor. A student has provided feedback on a step-by-step solution you generated for a math problem.
Your task is to refine the solution based on the feedback, making it clearer and easier to understand.
Respond with the refined step-by-step solution only.";

/// Render the user message: the question plus every search chunk with its
/// source URL and chunk id so the model can cite them.
pub fn solution_prompt(query: &str, search_results: &[SearchChunk]) -> String {
    let mut prompt = format!("User's Question: {query}\n\nWeb Search Results:\n");
    if search_results.is_empty() {
        prompt.push_str("(none available)\n");
    }
    for chunk in search_results {
        let _ = writeln!(
            prompt,
            "- Source URL: {} (chunk: {})\n  Content: {}",
            chunk.url, chunk.chunk_id, chunk.text
        );
    }
    prompt
}

pub fn refine_prompt(question: &str, original_solution: &str, feedback: &str) -> String {
    format!(
        "Original Question: {question}\n\nOriginal Solution: {original_solution}\n\nFeedback: {feedback}\n\nRefined Solution:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_prompt_lists_chunks() {
        let chunks = vec![SearchChunk {
            url: "https://math.example/quadratics".to_string(),
            chunk_id: "web-1".to_string(),
            text: "Use the quadratic formula.".to_string(),
        }];
        let prompt = solution_prompt("solve x^2 = 4", &chunks);
        assert!(prompt.contains("User's Question: solve x^2 = 4"));
        assert!(prompt.contains("https://math.example/quadratics"));
        assert!(prompt.contains("(chunk: web-1)"));
    }

    #[test]
    fn test_solution_prompt_without_chunks() {
        let prompt = solution_prompt("what is 2+2?", &[]);
        assert!(prompt.contains("(none available)"));
    }

    #[test]
    fn test_refine_prompt_carries_all_parts() {
        let prompt = refine_prompt("q", "original", "too terse");
        assert!(prompt.contains("Original Question: q"));
        assert!(prompt.contains("Original Solution: original"));
        assert!(prompt.contains("Feedback: too terse"));
    }
}
