//! Analyser for `pw.base` runs.

use std::sync::Arc;

use runtriage_records::ExecutionRecord;

use crate::analyser::{diagnose_from_tree, Diagnosable};
use crate::diagnosis::Diagnosis;
use crate::error::Result;

/// Plane-wave base runs carry no type-specific failure classification;
/// diagnosis is the generic localization, and source resolution follows
/// the record-then-structural-input chain.
pub struct PwBaseAnalyser {
    record: Arc<dyn ExecutionRecord>,
}

impl PwBaseAnalyser {
    pub fn new(record: Arc<dyn ExecutionRecord>) -> Self {
        Self { record }
    }
}

impl Diagnosable for PwBaseAnalyser {
    fn record(&self) -> &Arc<dyn ExecutionRecord> {
        &self.record
    }

    fn get_state(&self) -> Result<Diagnosis> {
        diagnose_from_tree(&self.record)
    }
}
