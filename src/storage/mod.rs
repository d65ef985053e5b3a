//! Persistence layer
//!
//! Only user feedback is durable; everything else in the service is
//! request-scoped or an immutable startup snapshot.

mod feedback;

pub use feedback::{FeedbackRecord, FeedbackStore, Rating, StorageError};
