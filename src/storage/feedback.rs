//! Feedback persistence
//!
//! Stores rating records in a named sled tree ("feedback"). Each record
//! links a user's rating to the question and the solution that was shown.
//! Records are keyed by submission timestamp (millisecond precision) for
//! natural chronological ordering; a same-millisecond re-submission is
//! last-write-wins.
//!
//! A save failure is reported to the caller but never affects the
//! already-displayed solution.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Tree;
use std::path::Path;
use thiserror::Error;

/// Errors from feedback persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// User rating of a displayed solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Bad,
}

/// One feedback record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub question: String,
    pub solution: String,
    pub rating: Rating,
    #[serde(default)]
    pub feedback_text: Option<String>,
    /// Unix timestamp in milliseconds; also the storage key.
    pub submitted_at: i64,
}

impl FeedbackRecord {
    pub fn new(
        question: String,
        solution: String,
        rating: Rating,
        feedback_text: Option<String>,
    ) -> Self {
        Self {
            question,
            solution,
            rating,
            feedback_text,
            submitted_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Handle to the feedback tree. Cheap to clone.
#[derive(Clone)]
pub struct FeedbackStore {
    tree: Tree,
}

impl FeedbackStore {
    /// Open (or create) the feedback store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        let tree = db.open_tree("feedback")?;
        Ok(Self { tree })
    }

    /// Persist one record keyed by its submission timestamp.
    pub fn persist(&self, record: &FeedbackRecord) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(record)?;
        self.tree.insert(record.submitted_at.to_be_bytes(), bytes)?;
        Ok(())
    }

    /// Load all records, oldest first.
    pub fn load_all(&self) -> Vec<FeedbackRecord> {
        self.tree
            .iter()
            .filter_map(|item| item.ok().and_then(|(_, v)| serde_json::from_slice(&v).ok()))
            .collect()
    }

    /// Number of stored records.
    pub fn count(&self) -> usize {
        self.tree.len()
    }
}
