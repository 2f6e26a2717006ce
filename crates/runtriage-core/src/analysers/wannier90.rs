//! Analyser for composite `wannier90` workflows.

use std::sync::Arc;

use runtriage_records::ExecutionRecord;

use crate::analyser::Diagnosable;
use crate::checklist::{diagnose_checklist, StageSpec};
use crate::diagnosis::Diagnosis;
use crate::error::Result;
use crate::registry::{tags, AnalyserRegistry};

/// Expected stages of a wannierization workflow, in execution order.
/// Only `projwfc` is optional; the projection step is skipped for runs
/// using analytic initial guesses.
const STAGES: &[StageSpec] = &[
    StageSpec {
        label: "scf",
        required: true,
        analyser_tag: tags::PW_BASE,
    },
    StageSpec {
        label: "nscf",
        required: true,
        analyser_tag: tags::PW_BASE,
    },
    StageSpec {
        label: "projwfc",
        required: false,
        analyser_tag: tags::PROJWFC_BASE,
    },
    StageSpec {
        label: "wannier90_pp",
        required: true,
        analyser_tag: tags::WANNIER90_BASE,
    },
    StageSpec {
        label: "pw2wannier90",
        required: true,
        analyser_tag: tags::PW2WANNIER90_BASE,
    },
    StageSpec {
        label: "wannier90",
        required: true,
        analyser_tag: tags::WANNIER90_BASE,
    },
];

/// Checklist analyser for the six-stage wannierization chain.
pub struct Wannier90Analyser {
    record: Arc<dyn ExecutionRecord>,
    registry: Arc<AnalyserRegistry>,
}

impl Wannier90Analyser {
    pub fn new(record: Arc<dyn ExecutionRecord>, registry: Arc<AnalyserRegistry>) -> Self {
        Self { record, registry }
    }
}

impl Diagnosable for Wannier90Analyser {
    fn record(&self) -> &Arc<dyn ExecutionRecord> {
        &self.record
    }

    fn get_state(&self) -> Result<Diagnosis> {
        diagnose_checklist(&self.record, &self.registry, STAGES)
    }
}
