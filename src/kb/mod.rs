//! Knowledge base: curated, pre-verified question/solution records
//!
//! Abstracts the lookup interface behind [`KnowledgeStore`] so backends can
//! be swapped:
//! - [`StaticKb`]: keyword-overlap search over a JSON-loaded snapshot
//! - [`NoOpStore`]: always empty (pilot mode / tests without a KB)
//!
//! The snapshot is loaded once at startup and shared read-only across all
//! requests for the process lifetime.

mod matcher;

pub use matcher::StaticKb;

use crate::types::KbMatch;
use std::path::Path;
use thiserror::Error;

/// Errors loading the KB asset at startup.
#[derive(Debug, Error)]
pub enum KbError {
    #[error("failed to read KB asset {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse KB asset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate KB entry id: {0}")]
    DuplicateId(String),
}

/// Trait for knowledge store backends.
///
/// Implementations must be thread-safe (Send + Sync): the routing pipeline
/// shares one store across concurrent requests.
pub trait KnowledgeStore: Send + Sync {
    /// Search for entries relevant to the (already redacted) query, ranked
    /// by score descending. Empty when nothing clears the threshold.
    fn search(&self, query: &str) -> Vec<KbMatch>;

    /// Store name for logging and health checks.
    fn store_name(&self) -> &'static str;

    /// Number of entries available for matching.
    fn entry_count(&self) -> usize;
}

/// Store that returns no matches, forcing every query down the web route.
pub struct NoOpStore;

impl KnowledgeStore for NoOpStore {
    fn search(&self, _query: &str) -> Vec<KbMatch> {
        Vec::new()
    }

    fn store_name(&self) -> &'static str {
        "NoOp"
    }

    fn entry_count(&self) -> usize {
        0
    }
}

/// Load the static KB from a JSON asset (`{ "entries": [...] }`).
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<StaticKb, KbError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| KbError::Io {
        path: path.display().to_string(),
        source,
    })?;
    StaticKb::from_json(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_store() {
        let store = NoOpStore;
        assert!(store.search("anything").is_empty());
        assert_eq!(store.store_name(), "NoOp");
        assert_eq!(store.entry_count(), 0);
    }

    #[test]
    fn test_trait_object() {
        let store: Box<dyn KnowledgeStore> = Box::new(NoOpStore);
        assert!(store.search("quadratic").is_empty());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_from_file("/nonexistent/kb.json").unwrap_err();
        assert!(matches!(err, KbError::Io { .. }));
    }
}
