//! Diagnosis-gated destructive cleanup.
//!
//! Cleanup is the only mutating operation in this crate, and it is not
//! safe to run concurrently against the same record — callers must
//! serialize cleanup per record. The working-directory pass and the
//! deletion pass are not transactional: a deletion failure after a
//! successful workdir pass surfaces the already-cleaned locations in the
//! error instead of masking them.

use runtriage_records::{RecordDeleter, WorkdirCleaner};
use tracing::{info, warn};

use crate::analyser::Diagnosable;
use crate::diagnosis::ExemptionSet;
use crate::error::{Result, TriageError};

/// Report of one cleanup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOutcome {
    /// Human-readable report: diagnosis, cleaned locations, deleted ids.
    pub message: String,
    /// False when the exemption set blocked the operation.
    pub changed: bool,
}

/// Diagnose `analyser`'s record, then clean and delete it.
///
/// When the diagnosis code is a member of `exemptions` the operation is
/// refused outright: no collaborator is invoked and `changed` is false.
/// Under `dry_run` both collaborators report intended actions without
/// mutating state, so repeated dry-run calls are idempotent.
pub fn clean_run<A: Diagnosable + ?Sized>(
    analyser: &A,
    exemptions: &ExemptionSet,
    dry_run: bool,
    cleaner: &dyn WorkdirCleaner,
    deleter: &dyn RecordDeleter,
) -> Result<CleanOutcome> {
    let record = analyser.record();
    let id = record.identity();
    let diagnosis = analyser.get_state()?;

    let mut message = format!(
        "Run<{}> is now {} at {}.\n",
        id.short(),
        diagnosis.code,
        diagnosis.path
    );

    if exemptions.contains(&diagnosis.code) {
        warn!(record = %id, code = %diagnosis.code, "cleanup refused: code is exempted");
        message.push_str("Cleanup refused: the diagnosis code is exempted.");
        return Ok(CleanOutcome {
            message,
            changed: false,
        });
    }

    let cleaned = cleaner
        .clean_working_directory(record.as_ref(), dry_run)
        .map_err(|e| TriageError::CleanupFailed {
            id: id.clone(),
            detail: e.to_string(),
        })?;
    message.push_str(&format!("Cleaned working directories of run <{}>:\n", id.short()));
    message.push_str(&format!("  {}\n", cleaned.join(" ")));

    let (deleted, warnings) = deleter
        .delete_subtree(&[id.clone()], dry_run)
        .map_err(|e| TriageError::DeletionFailed {
            cleaned: cleaned.clone(),
            detail: e.to_string(),
        })?;
    message.push_str(&format!("Deleted run <{}>:\n", id.short()));
    message.push_str(&format!(
        "  {}",
        deleted
            .iter()
            .map(|d| d.short())
            .collect::<Vec<_>>()
            .join(" ")
    ));
    for warning in &warnings {
        message.push_str(&format!("\nWarning: {warning}"));
    }

    info!(
        record = %id,
        dry_run = dry_run,
        cleaned = cleaned.len(),
        deleted = deleted.len(),
        "cleanup finished"
    );

    Ok(CleanOutcome {
        message,
        changed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::GenericAnalyser;
    use crate::diagnosis::DiagnosisCode;
    use runtriage_records::fakes::{FakeRecord, MemoryRecordDeleter, MemoryWorkdirCleaner};

    fn failed_analyser() -> GenericAnalyser {
        let leaf = FakeRecord::leaf("ph.calculation")
            .failed(312, "phonon run failed")
            .into_arc();
        let root = FakeRecord::composite("ph.base")
            .unresolved()
            .child("iteration_01", leaf)
            .into_arc();
        GenericAnalyser::new(root)
    }

    #[test]
    fn test_exemption_refuses_without_collaborator_calls() {
        let analyser = failed_analyser();
        let cleaner = MemoryWorkdirCleaner::new();
        let deleter = MemoryRecordDeleter::new();
        let mut exemptions = ExemptionSet::new();
        exemptions.insert(DiagnosisCode::Native(312));

        let outcome = clean_run(&analyser, &exemptions, false, &cleaner, &deleter).unwrap();
        assert!(!outcome.changed);
        assert!(outcome.message.contains("refused"));
        assert_eq!(cleaner.call_count(), 0);
        assert_eq!(deleter.call_count(), 0);
    }

    #[test]
    fn test_dry_run_is_idempotent_and_mutation_free() {
        let analyser = failed_analyser();
        let cleaner = MemoryWorkdirCleaner::new();
        let deleter = MemoryRecordDeleter::new();
        let exemptions = ExemptionSet::new();

        let first = clean_run(&analyser, &exemptions, true, &cleaner, &deleter).unwrap();
        let second = clean_run(&analyser, &exemptions, true, &cleaner, &deleter).unwrap();
        assert_eq!(first, second);
        assert!(first.changed);
        assert!(cleaner.mutated().is_empty());
        assert!(deleter.deleted().is_empty());
    }

    #[test]
    fn test_real_run_mutates_and_reports() {
        let analyser = failed_analyser();
        let cleaner = MemoryWorkdirCleaner::new();
        let deleter = MemoryRecordDeleter::new();
        let exemptions = ExemptionSet::new();

        let outcome = clean_run(&analyser, &exemptions, false, &cleaner, &deleter).unwrap();
        assert!(outcome.changed);
        assert_eq!(cleaner.mutated().len(), 1);
        assert_eq!(deleter.deleted().len(), 1);
        assert!(outcome.message.contains("Cleaned working directories"));
        assert!(outcome.message.contains("Deleted run"));
    }

    #[test]
    fn test_deletion_failure_surfaces_cleaned_locations() {
        let analyser = failed_analyser();
        let cleaner = MemoryWorkdirCleaner::new();
        let deleter = MemoryRecordDeleter::failing();
        let exemptions = ExemptionSet::new();

        let err = clean_run(&analyser, &exemptions, false, &cleaner, &deleter).unwrap_err();
        match err {
            TriageError::DeletionFailed { cleaned, .. } => {
                assert_eq!(cleaned.len(), 1);
            }
            other => panic!("expected DeletionFailed, got {other}"),
        }
    }

    #[test]
    fn test_workdir_failure_stops_before_deletion() {
        let analyser = failed_analyser();
        let cleaner = MemoryWorkdirCleaner::failing();
        let deleter = MemoryRecordDeleter::new();
        let exemptions = ExemptionSet::new();

        let err = clean_run(&analyser, &exemptions, false, &cleaner, &deleter).unwrap_err();
        assert!(matches!(err, TriageError::CleanupFailed { .. }));
        assert_eq!(deleter.call_count(), 0);
    }
}
