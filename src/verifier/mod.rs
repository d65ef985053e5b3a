//! Output guardrail: numeric verification of model-claimed answers
//!
//! Re-evaluates the generator's extracted final-answer expression and checks
//! it against the claimed numeric result. Verification is advisory, not
//! blocking: every evaluation error collapses to "not verified" and is never
//! propagated as a fatal error.

mod eval;

pub use eval::{evaluate, EvalError};

use std::collections::HashMap;
use tracing::debug;

/// Absolute tolerance for comparing evaluated values against the claimed
/// result.
pub const TOLERANCE: f64 = 1e-9;

/// Verify `expression` against the claimed `expected` result.
///
/// Three modes:
/// - `lhs = rhs` where `lhs` is a single identifier: bind the identifier to
///   `expected` and evaluate `rhs` in that scope; verified iff the result is
///   within tolerance of `expected` (handles "x = 6", "y = 10/2").
/// - any other expression containing `=`: treated as an equation predicate;
///   both sides are evaluated and must agree within tolerance ("5+2=7").
/// - no `=`: the whole expression is evaluated and compared to `expected`
///   ("2+2" against 4).
///
/// Malformed expressions and undefined symbols are verification failures,
/// never errors.
pub fn verify(expression: &str, expected: f64) -> bool {
    let verified = match check(expression, expected) {
        Ok(v) => v,
        Err(e) => {
            debug!(expression, error = %e, "verification failed to evaluate");
            false
        }
    };
    debug!(expression, expected, verified, "verification result");
    verified
}

fn check(expression: &str, expected: f64) -> Result<bool, EvalError> {
    if let Some(eq_pos) = expression.find('=') {
        let lhs = expression[..eq_pos].trim();
        // Tolerate "==" as equation syntax.
        let rhs = expression[eq_pos + 1..].trim_start_matches('=').trim();

        if is_identifier(lhs) {
            // Simple binding form: the right-hand side must independently
            // evaluate to the claimed result.
            let mut scope = HashMap::new();
            scope.insert(lhs.to_string(), expected);
            let value = evaluate(rhs, &scope)?;
            return Ok((value - expected).abs() < TOLERANCE);
        }

        // Full equation: evaluate both sides as a predicate.
        let scope = HashMap::new();
        let left = evaluate(lhs, &scope)?;
        let right = evaluate(rhs, &scope)?;
        return Ok((left - right).abs() < TOLERANCE);
    }

    let value = evaluate(expression, &HashMap::new())?;
    Ok((value - expected).abs() < TOLERANCE)
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_binding() {
        assert!(verify("x = 6", 6.0));
        assert!(!verify("x = 6", 7.0));
    }

    #[test]
    fn test_binding_with_arithmetic_rhs() {
        assert!(verify("y = 10/2", 5.0));
        assert!(!verify("y = 10/2", 4.0));
    }

    #[test]
    fn test_direct_expression() {
        assert!(verify("2+2", 4.0));
        assert!(!verify("2+2", 5.0));
        assert!(verify("sqrt(16) + 1", 5.0));
    }

    #[test]
    fn test_equation_predicate() {
        // Expected result is irrelevant for the predicate form.
        assert!(verify("5+2=7", f64::NAN));
        assert!(verify("5+2 = 7", 0.0));
        assert!(!verify("5+2=8", 7.0));
    }

    #[test]
    fn test_double_equals_tolerated() {
        assert!(verify("5+2 == 7", 0.0));
    }

    #[test]
    fn test_malformed_never_throws() {
        assert!(!verify("not-an-expr", 5.0));
        assert!(!verify("", 0.0));
        assert!(!verify("2 +", 2.0));
        assert!(!verify("x + = 3", 3.0));
    }

    #[test]
    fn test_undefined_symbol_fails() {
        // "2z = 4" has a non-identifier lhs and an undefined rhs symbol.
        assert!(!verify("2*z = 4", 2.0));
    }

    #[test]
    fn test_tolerance() {
        assert!(verify("0.1 + 0.2", 0.3));
        assert!(!verify("0.1 + 0.2", 0.301));
    }

    #[test]
    fn test_division_by_zero_fails_comparison() {
        assert!(!verify("1/0", 5.0));
    }
}
