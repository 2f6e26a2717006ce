//! Runtriage Core Library
//!
//! Post-processing for hierarchically executed computational runs:
//! snapshotting execution graphs, localizing faults, per-run-type
//! analysis, exemption-gated cleanup and batch aggregation.

pub mod aggregate;
pub mod analyser;
pub mod analysers;
pub mod checklist;
pub mod cleanup;
pub mod diagnosis;
pub mod error;
pub mod registry;
pub mod signatures;
pub mod telemetry;
pub mod tree;

pub use aggregate::{aggregate_group, recursive_merge, DIAGNOSIS_FAILED_BUCKET};
pub use analyser::{diagnose_from_tree, Diagnosable, GenericAnalyser};
pub use analysers::{
    stability_from_outputs, EpwBaseAnalyser, EpwPrepAnalyser, PhBaseAnalyser, PwBaseAnalyser,
    StabilityProbe, StabilityVerdict, Wannier90Analyser, UNCLASSIFIED_PH_FAILURE,
};
pub use checklist::{diagnose_checklist, StageSpec};
pub use cleanup::{clean_run, CleanOutcome};
pub use diagnosis::{Diagnosis, DiagnosisCode, ExemptionSet, ROOT_PATH};
pub use error::{Result, TriageError};
pub use registry::{tags, AnalyserFactory, AnalyserRegistry};
pub use signatures::{first_match, SignatureRule, SCHEDULER_STDERR_RULES};
pub use tree::{ProcessTree, MAX_TREE_DEPTH};

pub use runtriage_records::{
    ChildLink, ExecutionRecord, RecordDeleter, RecordError, RecordId, RecordResult, WorkdirCleaner,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
