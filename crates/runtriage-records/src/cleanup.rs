//! Cleanup collaborator traits.
//!
//! Destructive post-triage operations live behind these two traits:
//! scratch-directory cleanup and record subtree deletion. Both honor
//! `dry_run`, reporting intended actions without mutating state.
//!
//! Deletion is irreversible outside dry-run and is not transactional with
//! the working-directory pass; callers must serialize cleanup per record.

use crate::error::RecordResult;
use crate::record::{ExecutionRecord, RecordId};

/// Cleans the remote working directories left behind by leaf executions.
pub trait WorkdirCleaner: Send + Sync {
    /// Clean (or, under `dry_run`, enumerate) the working directories of
    /// every leaf execution under `record`. Returns the affected locations.
    fn clean_working_directory(
        &self,
        record: &dyn ExecutionRecord,
        dry_run: bool,
    ) -> RecordResult<Vec<String>>;
}

/// Deletes execution records from the external store by identity.
pub trait RecordDeleter: Send + Sync {
    /// Delete the records with the given ids and everything they called.
    ///
    /// Returns the ids actually (or, under `dry_run`, nominally) deleted,
    /// plus any non-fatal warnings raised by the store.
    fn delete_subtree(
        &self,
        ids: &[RecordId],
        dry_run: bool,
    ) -> RecordResult<(Vec<RecordId>, Vec<String>)>;
}
