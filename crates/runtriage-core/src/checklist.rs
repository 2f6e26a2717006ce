//! Ordered subprocess checklists for composite run-type analysers.
//!
//! A checklist encodes the expected execution order of a composite run's
//! named stages. Diagnosis walks the declared order and delegates to the
//! first present-but-unsuccessful stage's own analyser, prefixing the
//! stage label onto the returned path. Composite chains compose by
//! recursive delegation, producing slash-delimited paths of arbitrary
//! depth.

use std::sync::Arc;

use runtriage_records::ExecutionRecord;
use tracing::debug;

use crate::analyser::diagnose_from_tree;
use crate::diagnosis::Diagnosis;
use crate::error::Result;
use crate::registry::AnalyserRegistry;
use crate::tree::ProcessTree;

/// One expected named subprocess of a composite run.
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    /// Call-link label of the subprocess.
    pub label: &'static str,
    /// A required stage that is entirely absent sends diagnosis straight
    /// to the generic fault locator.
    pub required: bool,
    /// Registry tag of the analyser that interprets this subprocess.
    pub analyser_tag: &'static str,
}

/// Diagnose a composite run against its declared stage checklist.
///
/// 1. Root finished ok: success.
/// 2. First stage present in the tree whose record did not finish ok:
///    delegate to that stage's analyser and prefix the label (a `"ROOT"`
///    sub-path is replaced by the label outright).
/// 3. A required stage missing from the tree: generic fallback — absence
///    is informative but not independently classifiable.
/// 4. Every declared stage present and green, root still not ok: generic
///    fallback, catching failures in unlabeled or dynamic leaves (e.g.
///    retry iterations) the checklist does not cover.
pub fn diagnose_checklist(
    record: &Arc<dyn ExecutionRecord>,
    registry: &Arc<AnalyserRegistry>,
    stages: &[StageSpec],
) -> Result<Diagnosis> {
    if record.is_finished_ok() {
        return Ok(Diagnosis::finished_ok());
    }

    let tree = ProcessTree::build(Arc::clone(record))?;

    for stage in stages {
        match tree.get(stage.label) {
            Ok(node) => {
                if !node.record.is_finished_ok() {
                    debug!(
                        record = %record.identity(),
                        stage = stage.label,
                        "delegating to failed stage analyser"
                    );
                    let analyser = registry.resolve_tag(stage.analyser_tag, Arc::clone(&node.record));
                    let diagnosis = analyser.get_state()?;
                    return Ok(diagnosis.prefixed(stage.label));
                }
            }
            Err(_) if stage.required => {
                debug!(
                    record = %record.identity(),
                    stage = stage.label,
                    "required stage absent, falling back to tree localization"
                );
                return diagnose_from_tree(record);
            }
            Err(_) => continue,
        }
    }

    diagnose_from_tree(record)
}
