//! Analyser for `ph.base` runs: signature reclassification and the
//! stability post-condition hook.
//!
//! The native status 312 is intentionally generic ("unclassified phonon
//! failure"); this analyser refines it by scanning the last-executed
//! leaf's captured output against an ordered signature rule list. A
//! root-level success is additionally checked by an injectable stability
//! probe, which can override the result to `UNSTABLE` while preserving
//! the `"ROOT"` path. Neither refinement is allowed to crash diagnosis:
//! every internal failure degrades to a note on the unrefined result.

use std::sync::Arc;

use anyhow::Context;
use runtriage_records::ExecutionRecord;
use tracing::debug;

use crate::analyser::{diagnose_from_tree, Diagnosable};
use crate::diagnosis::{Diagnosis, DiagnosisCode, ROOT_PATH};
use crate::error::Result;
use crate::registry::tags;
use crate::signatures::{first_match, SignatureRule, SCHEDULER_STDERR_RULES};
use crate::tree::ProcessTree;

/// Native exit status the engine assigns to unclassified phonon failures.
pub const UNCLASSIFIED_PH_FAILURE: i32 = 312;

/// Stdout signatures of known phonon failure modes, in priority order.
const PH_STDOUT_RULES: &[SignatureRule] = &[
    SignatureRule {
        needle: "Error in routine find_mode_sym (1)",
        label: "ERROR_FIND_MODE_SYM",
    },
    SignatureRule {
        needle: "Error in routine set_irr_sym_new (922)",
        label: "ERROR_SET_IRR_SYM_NEW",
    },
    SignatureRule {
        needle: "Error in routine set_irr_sym_new (822)",
        label: "ERROR_WRONG_REPRESENTATION",
    },
    SignatureRule {
        needle: "Error in routine cdiaghg (4)",
        label: "ERROR_CDIAGHG",
    },
    SignatureRule {
        needle: "Error in routine cdiaghg (126)",
        label: "ERROR_S_MATRIX_NOT_POSITIVE_DEFINITE",
    },
    SignatureRule {
        needle: "Error in routine phq_setup (1)",
        label: "ERROR_PHQ_SETUP",
    },
    SignatureRule {
        needle: "Error in routine q_points (1)",
        label: "ERROR_Q_POINTS",
    },
    SignatureRule {
        needle: "Error in routine davcio (99)",
        label: "ERROR_DAVCIO",
    },
    SignatureRule {
        needle: "Error in routine check_all_convt (1)",
        label: "ERROR_CHECK_ALL_CONVT",
    },
    SignatureRule {
        needle: "Error in routine read_wfc (29)",
        label: "ERROR_READ_WFC",
    },
];

/// Verdict of a stability post-condition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityVerdict {
    pub stable: bool,
    pub detail: String,
}

/// Injectable post-condition hook consuming a record's declared outputs.
/// The physics behind the verdict lives with the caller.
pub type StabilityProbe =
    Arc<dyn Fn(&dyn ExecutionRecord) -> anyhow::Result<StabilityVerdict> + Send + Sync>;

/// Default probe: read the engine-parsed `stability_report` output field
/// (`{"is_stable": bool, "detail": str}`).
pub fn stability_from_outputs(record: &dyn ExecutionRecord) -> anyhow::Result<StabilityVerdict> {
    let report = record
        .output_field("stability_report")
        .context("no stability_report in declared outputs")?;
    let stable = report
        .get("is_stable")
        .and_then(|v| v.as_bool())
        .context("stability_report is missing a boolean is_stable")?;
    let detail = report
        .get("detail")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    Ok(StabilityVerdict { stable, detail })
}

/// Analyser for `ph.base` runs.
pub struct PhBaseAnalyser {
    record: Arc<dyn ExecutionRecord>,
    probe: StabilityProbe,
}

impl PhBaseAnalyser {
    pub fn new(record: Arc<dyn ExecutionRecord>) -> Self {
        Self {
            record,
            probe: Arc::new(stability_from_outputs),
        }
    }

    /// Replace the stability probe (tests, alternative stability models).
    pub fn with_probe(mut self, probe: StabilityProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Refine an unclassified failure via the last-executed leaf's output.
    /// Infallible: anything that goes wrong degrades to a note.
    fn reclassify(&self, diagnosis: Diagnosis) -> Diagnosis {
        let tree = match ProcessTree::build(Arc::clone(&self.record)) {
            Ok(tree) => tree,
            Err(e) => return diagnosis.with_note(&format!("error analysis failed: {e}")),
        };
        let last = tree.find_last_node();
        if last.record.run_type() != tags::PH_CALCULATION {
            return diagnosis.with_note(&format!(
                "last run is {}, not a {} leaf",
                last.record.run_type(),
                tags::PH_CALCULATION
            ));
        }

        let stdout = last.record.captured_stdout().unwrap_or_default();
        if let Some(rule) = first_match(&stdout, PH_STDOUT_RULES) {
            debug!(record = %self.record.identity(), label = rule.label, "stdout signature matched");
            return Diagnosis::new(
                diagnosis.path,
                DiagnosisCode::Signature(rule.label.to_string()),
                format!("{} (detected: {})", diagnosis.message, rule.label),
            );
        }

        let stderr = last.record.captured_stderr().unwrap_or_default();
        if let Some(rule) = first_match(&stderr, SCHEDULER_STDERR_RULES) {
            debug!(record = %self.record.identity(), label = rule.label, "stderr signature matched");
            return Diagnosis::new(
                diagnosis.path,
                DiagnosisCode::Signature(rule.label.to_string()),
                format!("{} (detected: {})", diagnosis.message, rule.label),
            );
        }

        Diagnosis::new(
            diagnosis.path,
            DiagnosisCode::Unknown,
            format!("{} (unable to determine specific error)", diagnosis.message),
        )
    }

    /// Post-condition check on a success-shaped diagnosis. A probe failure
    /// leaves the success intact and appends a note.
    fn check_stability(&self, diagnosis: Diagnosis) -> Diagnosis {
        match (self.probe)(self.record.as_ref()) {
            Ok(verdict) if !verdict.stable => Diagnosis::new(
                ROOT_PATH,
                DiagnosisCode::Signature("UNSTABLE".to_string()),
                format!("{}\n    {}", diagnosis.message, verdict.detail),
            ),
            Ok(_) => diagnosis,
            Err(e) => diagnosis.with_note(&format!("stability check failed: {e:#}")),
        }
    }
}

impl Diagnosable for PhBaseAnalyser {
    fn record(&self) -> &Arc<dyn ExecutionRecord> {
        &self.record
    }

    fn get_state(&self) -> Result<Diagnosis> {
        let diagnosis = diagnose_from_tree(&self.record)?;

        let diagnosis = if diagnosis.code == DiagnosisCode::Native(UNCLASSIFIED_PH_FAILURE) {
            self.reclassify(diagnosis)
        } else {
            diagnosis
        };

        // Root success and semantic override are distinct cases; both must
        // return explicitly.
        if diagnosis.is_success() {
            return Ok(self.check_stability(diagnosis));
        }
        Ok(diagnosis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtriage_records::fakes::FakeRecord;
    use serde_json::json;

    fn ph_root_with_leaf(leaf: Arc<dyn ExecutionRecord>) -> Arc<dyn ExecutionRecord> {
        FakeRecord::composite(tags::PH_BASE)
            .failed(UNCLASSIFIED_PH_FAILURE, "phonon run failed")
            .child("iteration_01", leaf)
            .into_arc()
    }

    #[test]
    fn test_312_reclassified_from_stdout_signature() {
        let leaf = FakeRecord::leaf(tags::PH_CALCULATION)
            .failed(UNCLASSIFIED_PH_FAILURE, "phonon run failed")
            .with_stdout("...\n Error in routine cdiaghg (126)\n...")
            .into_arc();
        let d = PhBaseAnalyser::new(ph_root_with_leaf(leaf))
            .get_state()
            .unwrap();
        assert_eq!(
            d.code,
            DiagnosisCode::Signature("ERROR_S_MATRIX_NOT_POSITIVE_DEFINITE".to_string())
        );
        assert!(d.message.contains("detected: ERROR_S_MATRIX_NOT_POSITIVE_DEFINITE"));
        assert_eq!(d.path, "iteration_01");
    }

    #[test]
    fn test_stdout_rules_win_over_stderr_rules() {
        let leaf = FakeRecord::leaf(tags::PH_CALCULATION)
            .failed(UNCLASSIFIED_PH_FAILURE, "phonon run failed")
            .with_stdout("Error in routine davcio (99)")
            .with_stderr("DUE TO TIME LIMIT")
            .into_arc();
        let d = PhBaseAnalyser::new(ph_root_with_leaf(leaf))
            .get_state()
            .unwrap();
        assert_eq!(d.code, DiagnosisCode::Signature("ERROR_DAVCIO".to_string()));
    }

    #[test]
    fn test_scheduler_stderr_fallback() {
        let leaf = FakeRecord::leaf(tags::PH_CALCULATION)
            .failed(UNCLASSIFIED_PH_FAILURE, "phonon run failed")
            .with_stderr("slurmstepd: CANCELLED DUE TO TIME LIMIT")
            .into_arc();
        let d = PhBaseAnalyser::new(ph_root_with_leaf(leaf))
            .get_state()
            .unwrap();
        assert_eq!(
            d.code,
            DiagnosisCode::Signature("SCHEDULER_TIME_LIMIT".to_string())
        );
    }

    #[test]
    fn test_no_signature_degrades_to_unknown() {
        let leaf = FakeRecord::leaf(tags::PH_CALCULATION)
            .failed(UNCLASSIFIED_PH_FAILURE, "phonon run failed")
            .with_stdout("nothing recognizable here")
            .into_arc();
        let d = PhBaseAnalyser::new(ph_root_with_leaf(leaf))
            .get_state()
            .unwrap();
        assert_eq!(d.code, DiagnosisCode::Unknown);
        assert!(d.message.contains("unable to determine specific error"));
    }

    #[test]
    fn test_wrong_last_leaf_type_aborts_reclassification() {
        let leaf = FakeRecord::leaf(tags::PW_CALCULATION)
            .failed(UNCLASSIFIED_PH_FAILURE, "phonon run failed")
            .with_stdout("Error in routine davcio (99)")
            .into_arc();
        let d = PhBaseAnalyser::new(ph_root_with_leaf(leaf))
            .get_state()
            .unwrap();
        // Unrefined code, explanatory note appended.
        assert_eq!(d.code, DiagnosisCode::Native(UNCLASSIFIED_PH_FAILURE));
        assert!(d.message.contains("not a ph.calculation leaf"));
    }

    #[test]
    fn test_other_native_codes_pass_through() {
        let leaf = FakeRecord::leaf(tags::PH_CALCULATION)
            .failed(305, "input error")
            .into_arc();
        let root = FakeRecord::composite(tags::PH_BASE)
            .failed(305, "input error")
            .child("iteration_01", leaf)
            .into_arc();
        let d = PhBaseAnalyser::new(root).get_state().unwrap();
        assert_eq!(d.code, DiagnosisCode::Native(305));
    }

    #[test]
    fn test_unstable_override_preserves_root_path() {
        let root = FakeRecord::composite(tags::PH_BASE)
            .with_output(
                "stability_report",
                json!({"is_stable": false, "detail": "3 negative frequencies at q-point 1"}),
            )
            .into_arc();
        let d = PhBaseAnalyser::new(root).get_state().unwrap();
        assert_eq!(d.path, ROOT_PATH);
        assert_eq!(d.code, DiagnosisCode::Signature("UNSTABLE".to_string()));
        assert!(d.message.contains("negative frequencies"));
    }

    #[test]
    fn test_stable_success_stays_success() {
        let root = FakeRecord::composite(tags::PH_BASE)
            .with_output("stability_report", json!({"is_stable": true, "detail": ""}))
            .into_arc();
        let d = PhBaseAnalyser::new(root).get_state().unwrap();
        assert!(d.is_success());
        assert_eq!(d.message, "finished OK");
    }

    #[test]
    fn test_probe_failure_keeps_success_with_note() {
        // No stability_report output at all.
        let root = FakeRecord::composite(tags::PH_BASE).into_arc();
        let d = PhBaseAnalyser::new(root).get_state().unwrap();
        assert!(d.is_success());
        assert!(d.message.contains("stability check failed"));
    }

    #[test]
    fn test_custom_probe_is_honored() {
        let root = FakeRecord::composite(tags::PH_BASE).into_arc();
        let probe: StabilityProbe = Arc::new(|_| {
            Ok(StabilityVerdict {
                stable: false,
                detail: "custom model says unstable".to_string(),
            })
        });
        let d = PhBaseAnalyser::new(root)
            .with_probe(probe)
            .get_state()
            .unwrap();
        assert_eq!(d.code, DiagnosisCode::Signature("UNSTABLE".to_string()));
    }
}
