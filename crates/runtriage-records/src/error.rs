//! Error taxonomy for the execution record contract.

/// Errors surfaced by record store collaborators.
///
/// A snapshot built from a live record graph can go stale when another
/// actor deletes records between construction and use; collaborators must
/// report that clearly instead of returning wrong data.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("linked child record {id} is unavailable (deleted or unreachable)")]
    ChildUnavailable { id: String },

    #[error("captured {stream} for record {id} is unavailable")]
    StreamUnavailable { id: String, stream: String },

    #[error("record backend error: {0}")]
    Backend(String),
}

/// Result type for record store operations.
pub type RecordResult<T> = std::result::Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_unavailable_display() {
        let err = RecordError::ChildUnavailable {
            id: "abc123".to_string(),
        };
        assert!(err.to_string().contains("abc123"));
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_stream_unavailable_display() {
        let err = RecordError::StreamUnavailable {
            id: "abc123".to_string(),
            stream: "stdout".to_string(),
        };
        assert!(err.to_string().contains("stdout"));
    }
}
