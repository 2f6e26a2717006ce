//! Analyser for `epw.base` runs.

use std::sync::Arc;

use runtriage_records::ExecutionRecord;

use crate::analyser::{diagnose_from_tree, Diagnosable};
use crate::diagnosis::Diagnosis;
use crate::error::Result;

/// Electron-phonon base runs: generic localization, shared source chain.
pub struct EpwBaseAnalyser {
    record: Arc<dyn ExecutionRecord>,
}

impl EpwBaseAnalyser {
    pub fn new(record: Arc<dyn ExecutionRecord>) -> Self {
        Self { record }
    }
}

impl Diagnosable for EpwBaseAnalyser {
    fn record(&self) -> &Arc<dyn ExecutionRecord> {
        &self.record
    }

    fn get_state(&self) -> Result<Diagnosis> {
        diagnose_from_tree(&self.record)
    }
}
