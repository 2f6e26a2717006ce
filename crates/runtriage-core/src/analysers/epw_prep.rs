//! Analyser for the `epw.prep` preparation chain.

use std::sync::Arc;

use runtriage_records::ExecutionRecord;

use crate::analyser::Diagnosable;
use crate::checklist::{diagnose_checklist, StageSpec};
use crate::diagnosis::Diagnosis;
use crate::error::Result;
use crate::registry::{tags, AnalyserRegistry};

/// Preparation stages in execution order. The final band interpolation
/// is optional; preparation runs launched for transport only skip it.
const STAGES: &[StageSpec] = &[
    StageSpec {
        label: "w90_intp",
        required: true,
        analyser_tag: tags::WANNIER90,
    },
    StageSpec {
        label: "ph_base",
        required: true,
        analyser_tag: tags::PH_BASE,
    },
    StageSpec {
        label: "epw_base",
        required: true,
        analyser_tag: tags::EPW_BASE,
    },
    StageSpec {
        label: "epw_bands",
        required: false,
        analyser_tag: tags::EPW_BASE,
    },
];

/// Checklist analyser for electron-phonon preparation runs. Each stage
/// delegates to its own analyser, so diagnoses from composite stages
/// come back with multi-segment paths.
pub struct EpwPrepAnalyser {
    record: Arc<dyn ExecutionRecord>,
    registry: Arc<AnalyserRegistry>,
}

impl EpwPrepAnalyser {
    pub fn new(record: Arc<dyn ExecutionRecord>, registry: Arc<AnalyserRegistry>) -> Self {
        Self { record, registry }
    }
}

impl Diagnosable for EpwPrepAnalyser {
    fn record(&self) -> &Arc<dyn ExecutionRecord> {
        &self.record
    }

    fn get_state(&self) -> Result<Diagnosis> {
        diagnose_checklist(&self.record, &self.registry, STAGES)
    }
}
