//! Keyword-overlap matcher over the static KB snapshot
//!
//! This is a heuristic lexical matcher, not semantic search: each entry
//! carries a curated keyword set, and the score is the fraction of query
//! tokens covered by that set. Keyword lists must be curated per entry for
//! matching to work at all.

use super::{KbError, KnowledgeStore};
use crate::types::{KbEntry, KbMatch};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

/// Entries only score when they cover strictly more than this fraction of
/// the query tokens.
const SCORE_THRESHOLD: f64 = 0.3;

/// Tokens shorter than this are noise ("a", "is", single digits) and are
/// dropped before scoring.
const MIN_TOKEN_LEN: usize = 2;

#[derive(Deserialize)]
struct KbDocument {
    entries: Vec<KbEntry>,
}

/// Immutable KB snapshot with keyword-overlap search.
#[derive(Debug)]
pub struct StaticKb {
    entries: Vec<KbEntry>,
}

impl StaticKb {
    /// Build a snapshot from the raw JSON asset, rejecting duplicate ids.
    pub fn from_json(raw: &str) -> Result<Self, KbError> {
        let doc: KbDocument = serde_json::from_str(raw)?;
        let mut seen = HashSet::new();
        for entry in &doc.entries {
            if !seen.insert(entry.id.clone()) {
                return Err(KbError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self {
            entries: doc.entries,
        })
    }

    /// Build a snapshot directly from entries (tests, embedded fixtures).
    pub fn from_entries(entries: Vec<KbEntry>) -> Self {
        Self { entries }
    }
}

/// Normalize a query into lowercase alphanumeric tokens, dropping short ones.
///
/// Non-alphanumeric characters are deleted in place, not replaced by
/// whitespace, so math notation collapses into one token ("2+2" -> "22")
/// instead of shattering into droppable single characters.
fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.len() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

impl KnowledgeStore for StaticKb {
    fn search(&self, query: &str) -> Vec<KbMatch> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            // Defined as score 0 for every entry, i.e. below threshold.
            return Vec::new();
        }

        let mut matches: Vec<KbMatch> = Vec::new();
        for entry in &self.entries {
            let common = entry
                .keywords
                .iter()
                .filter(|kw| tokens.iter().any(|t| t == *kw))
                .count();
            if common == 0 {
                continue;
            }
            let score = common as f64 / tokens.len() as f64;
            if score > SCORE_THRESHOLD {
                matches.push(KbMatch {
                    id: entry.id.clone(),
                    question: entry.question.clone(),
                    solution: entry.solution.clone(),
                    verified: entry.verified,
                    score: (score * 100.0).round() / 100.0,
                });
            }
        }

        // Stable sort: ties keep KB iteration order.
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        if matches.is_empty() {
            debug!(query, "no KB matches above threshold");
        } else {
            debug!(query, hits = matches.len(), top = %matches[0].id, "KB matches found");
        }
        matches
    }

    fn store_name(&self) -> &'static str {
        "StaticKb"
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
