//! Input guardrails
//!
//! PII redaction runs before any other pipeline stage so that emails and
//! phone numbers never reach the KB matcher, the search provider, or the
//! model. Redaction is advisory logging only; it never blocks a request.

mod redactor;

pub use redactor::{redact, Redaction};
