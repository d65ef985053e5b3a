//! PII redaction rules
//!
//! An ordered list of pattern rules scrubs free text before further
//! processing. Each match is replaced by a fixed placeholder tagged with the
//! rule name, e.g. `[REDACTED_EMAIL]`. Rules are applied in a fixed order so
//! the output is deterministic for a given input.

use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

/// Result of running the redaction rules over one input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    /// The input with every PII match replaced by its placeholder.
    pub text: String,
    /// True iff at least one rule matched.
    pub was_redacted: bool,
}

struct PiiRule {
    name: &'static str,
    pattern: Regex,
}

/// Rules compiled once; evaluation order is the declaration order.
static PII_RULES: OnceLock<Vec<PiiRule>> = OnceLock::new();

fn pii_rules() -> &'static Vec<PiiRule> {
    PII_RULES.get_or_init(|| {
        vec![
            PiiRule {
                name: "EMAIL",
                pattern: Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
                    .expect("email pattern is a valid regex"),
            },
            PiiRule {
                name: "PHONE",
                pattern: Regex::new(r"(\+\d{1,2}\s?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}")
                    .expect("phone pattern is a valid regex"),
            },
        ]
    })
}

/// Scrub emails and phone numbers from `text`.
///
/// Infallible: operates on the literal text given and always produces a
/// result. Redaction events are logged so guardrail activity is observable.
pub fn redact(text: &str) -> Redaction {
    let mut redacted = text.to_string();
    let mut was_redacted = false;

    for rule in pii_rules() {
        if rule.pattern.is_match(&redacted) {
            was_redacted = true;
            info!(rule = rule.name, "redacted PII from query");
            redacted = rule
                .pattern
                .replace_all(&redacted, format!("[REDACTED_{}]", rule.name))
                .into_owned();
        }
    }

    Redaction {
        text: redacted,
        was_redacted,
    }
}
