//! Triage-level error taxonomy.
//!
//! Structural and navigation errors (a missing expected child, a stale
//! snapshot, a pathological tree) raise immediately — they indicate a
//! caller precondition violation. Classification and post-condition
//! failures never surface here; analysers catch them locally and degrade
//! the diagnosis instead.

use runtriage_records::{RecordError, RecordId};

/// Errors produced by tree navigation, source resolution, and cleanup.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("no child named '{label}' under '{parent}'")]
    NotFound { label: String, parent: String },

    #[error("source provenance is not set on record {id} or its structural input")]
    SourceUnset { id: RecordId },

    #[error("process tree exceeds the maximum depth of {limit} levels")]
    DepthLimitExceeded { limit: usize },

    #[error("record error: {0}")]
    Record(#[from] RecordError),

    #[error("working-directory cleanup failed for {id}: {detail}")]
    CleanupFailed { id: RecordId, detail: String },

    #[error(
        "deletion failed after working directories were already cleaned ({cleaned:?}): {detail}"
    )]
    DeletionFailed { cleaned: Vec<String>, detail: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_names_both_labels() {
        let err = TriageError::NotFound {
            label: "nscf".to_string(),
            parent: "ROOT".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nscf"));
        assert!(msg.contains("ROOT"));
    }

    #[test]
    fn test_record_error_converts() {
        let err: TriageError = RecordError::Backend("boom".to_string()).into();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_deletion_failed_carries_cleaned_locations() {
        let err = TriageError::DeletionFailed {
            cleaned: vec!["remote:/scratch/a1b2".to_string()],
            detail: "store rejected deletion".to_string(),
        };
        assert!(err.to_string().contains("remote:/scratch/a1b2"));
    }
}
