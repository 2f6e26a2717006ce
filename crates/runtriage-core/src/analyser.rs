//! The diagnosable capability and the generic fault-localization engine.
//!
//! [`Diagnosable`] is the interface every run-type analyser implements:
//! one generic default plus per-type variants selected through the
//! [`crate::registry::AnalyserRegistry`]. Specialized analysers defer to
//! [`diagnose_from_tree`] whenever their own checklists are exhausted.

use std::sync::Arc;

use runtriage_records::{ExecutionRecord, RecordDeleter, WorkdirCleaner};
use tracing::debug;

use crate::cleanup::{clean_run, CleanOutcome};
use crate::diagnosis::{Diagnosis, DiagnosisCode, ExemptionSet};
use crate::error::{Result, TriageError};
use crate::tree::ProcessTree;

/// Generic depth-first fault localization over a fresh snapshot.
///
/// Root finished ok yields `("ROOT", 0, "finished OK")`. Otherwise the
/// first failing leaf in pre-order is reported with its native exit
/// status; when every leaf reports success yet the root did not finish
/// (an inconsistent or still-composing state), the diagnosis degrades to
/// `("ROOT", -1, ...)`.
pub fn diagnose_from_tree(record: &Arc<dyn ExecutionRecord>) -> Result<Diagnosis> {
    if record.is_finished_ok() {
        return Ok(Diagnosis::finished_ok());
    }

    let tree = ProcessTree::build(Arc::clone(record))?;
    match tree.locate_failed_leaf() {
        Some((path, node)) => {
            let code = DiagnosisCode::from_exit(node.record.exit_status());
            let message = node.record.exit_message().unwrap_or_default();
            debug!(
                record = %record.identity(),
                path = %path,
                code = %code,
                "localized failing leaf"
            );
            Ok(Diagnosis::new(path, code, message))
        }
        None => Ok(Diagnosis::unknown("Unknown status")),
    }
}

/// Capability interface of a run analyser.
///
/// `get_state` must return a value for any record with a resolvable tree;
/// structural errors (stale children, pathological depth) raise, while
/// classification failures degrade the diagnosis instead.
pub trait Diagnosable: Send + Sync {
    /// The record under analysis.
    fn record(&self) -> &Arc<dyn ExecutionRecord>;

    /// Diagnose the run: success, a located failure, or unknown.
    fn get_state(&self) -> Result<Diagnosis>;

    /// Resolve the provenance id (`source_db-source_id`), checking the
    /// record's own extras first, then its declared structural input.
    fn get_source(&self) -> Result<String> {
        let record = self.record();
        if let (Some(db), Some(id)) = (
            record.get_extra("source_db"),
            record.get_extra("source_id"),
        ) {
            return Ok(format!("{db}-{id}"));
        }
        if let (Some(db), Some(id)) = (
            record.get_input_extra("source_db"),
            record.get_input_extra("source_id"),
        ) {
            return Ok(format!("{db}-{id}"));
        }
        Err(TriageError::SourceUnset {
            id: record.identity(),
        })
    }

    /// Diagnose, then clean working directories and delete the record
    /// subtree — unless the diagnosis code is exempted. See
    /// [`crate::cleanup::clean_run`].
    fn clean(
        &self,
        exemptions: &ExemptionSet,
        dry_run: bool,
        cleaner: &dyn WorkdirCleaner,
        deleter: &dyn RecordDeleter,
    ) -> Result<CleanOutcome> {
        clean_run(self, exemptions, dry_run, cleaner, deleter)
    }
}

/// The default analyser: generic localization, no run-type knowledge.
pub struct GenericAnalyser {
    record: Arc<dyn ExecutionRecord>,
}

impl GenericAnalyser {
    pub fn new(record: Arc<dyn ExecutionRecord>) -> Self {
        Self { record }
    }

    /// Fresh snapshot of the run's call graph.
    pub fn process_tree(&self) -> Result<ProcessTree> {
        ProcessTree::build(Arc::clone(&self.record))
    }
}

impl Diagnosable for GenericAnalyser {
    fn record(&self) -> &Arc<dyn ExecutionRecord> {
        &self.record
    }

    fn get_state(&self) -> Result<Diagnosis> {
        diagnose_from_tree(&self.record)
    }
}
