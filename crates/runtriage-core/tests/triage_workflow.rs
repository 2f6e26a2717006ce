//! End-to-end triage flows: registry-driven diagnosis, signature
//! reclassification, exemption-gated cleanup and group aggregation.

use std::sync::Arc;

use runtriage_core::{
    aggregate_group, tags, AnalyserRegistry, DiagnosisCode, ExecutionRecord, ExemptionSet,
    DIAGNOSIS_FAILED_BUCKET,
};
use runtriage_records::fakes::{FakeRecord, MemoryRecordDeleter, MemoryWorkdirCleaner};
use serde_json::json;
use tracing::Level;

fn init_logging() {
    runtriage_core::telemetry::init_tracing(false, Level::DEBUG);
}

fn pw_base_ok() -> Arc<dyn ExecutionRecord> {
    FakeRecord::composite(tags::PW_BASE).into_arc()
}

fn pw_base_failed(status: i32, message: &str) -> Arc<dyn ExecutionRecord> {
    let leaf = FakeRecord::leaf(tags::PW_CALCULATION)
        .failed(status, message)
        .into_arc();
    FakeRecord::composite(tags::PW_BASE)
        .failed(status, message)
        .child("iteration_01", leaf)
        .into_arc()
}

#[test]
fn unfinished_root_localizes_first_failing_leaf() {
    init_logging();
    let scf = FakeRecord::leaf(tags::PW_CALCULATION).into_arc();
    let nscf = FakeRecord::leaf(tags::PW_CALCULATION)
        .failed(500, "SCF did not converge")
        .into_arc();
    let root = FakeRecord::composite("bands")
        .unresolved()
        .child("scf", scf)
        .child("nscf", nscf)
        .into_arc();

    let registry = AnalyserRegistry::builtin();
    let diagnosis = registry.resolve(root).get_state().unwrap();
    assert_eq!(diagnosis.path, "nscf");
    assert_eq!(diagnosis.code, DiagnosisCode::Native(500));
    assert_eq!(diagnosis.message, "SCF did not converge");
}

#[test]
fn preparation_chain_produces_multi_segment_paths() {
    init_logging();
    let nscf = pw_base_failed(500, "SCF did not converge");
    let w90 = FakeRecord::composite(tags::WANNIER90)
        .unresolved()
        .child("scf", pw_base_ok())
        .child("nscf", nscf)
        .into_arc();
    let root = FakeRecord::composite(tags::EPW_PREP)
        .unresolved()
        .child("w90_intp", w90)
        .into_arc();

    let registry = AnalyserRegistry::builtin();
    let diagnosis = registry.resolve(root).get_state().unwrap();
    assert_eq!(diagnosis.path, "w90_intp/nscf/iteration_01");
    assert_eq!(diagnosis.code, DiagnosisCode::Native(500));
}

#[test]
fn unclassified_phonon_failure_is_reclassified_via_registry() {
    init_logging();
    let leaf = FakeRecord::leaf(tags::PH_CALCULATION)
        .failed(312, "phonon run failed")
        .with_stdout("     Error in routine set_irr_sym_new (922):\n")
        .into_arc();
    let root = FakeRecord::composite(tags::PH_BASE)
        .failed(312, "phonon run failed")
        .child("ph_01", leaf)
        .into_arc();

    let registry = AnalyserRegistry::builtin();
    let diagnosis = registry.resolve(root).get_state().unwrap();
    assert_eq!(
        diagnosis.code,
        DiagnosisCode::Signature("ERROR_SET_IRR_SYM_NEW".to_string())
    );
    assert_eq!(diagnosis.path, "ph_01");
}

#[test]
fn unstable_phonon_run_is_exempt_from_cleanup() {
    init_logging();
    let root = FakeRecord::composite(tags::PH_BASE)
        .with_output(
            "stability_report",
            json!({"is_stable": false, "detail": "negative frequencies at Gamma"}),
        )
        .into_arc();

    let registry = AnalyserRegistry::builtin();
    let analyser = registry.resolve(root);

    let mut exemptions = ExemptionSet::new();
    exemptions.insert(DiagnosisCode::Signature("UNSTABLE".to_string()));
    let cleaner = MemoryWorkdirCleaner::new();
    let deleter = MemoryRecordDeleter::new();

    let outcome = analyser
        .clean(&exemptions, false, &cleaner, &deleter)
        .unwrap();
    assert!(!outcome.changed);
    assert!(outcome.message.contains("refused"));
    assert_eq!(cleaner.call_count(), 0);
    assert_eq!(deleter.call_count(), 0);
}

#[test]
fn non_exempt_failure_is_cleaned_and_deleted() {
    init_logging();
    let root = pw_base_failed(410, "convergence not reached");
    let registry = AnalyserRegistry::builtin();
    let analyser = registry.resolve(root);

    let mut exemptions = ExemptionSet::new();
    exemptions.insert(DiagnosisCode::Success);
    let cleaner = MemoryWorkdirCleaner::new();
    let deleter = MemoryRecordDeleter::new();

    let outcome = analyser
        .clean(&exemptions, false, &cleaner, &deleter)
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(cleaner.mutated().len(), 1);
    assert_eq!(deleter.deleted().len(), 1);
}

#[test]
fn dry_run_cleanup_leaves_state_untouched() {
    init_logging();
    let root = pw_base_failed(410, "convergence not reached");
    let registry = AnalyserRegistry::builtin();
    let analyser = registry.resolve(root);

    let cleaner = MemoryWorkdirCleaner::new();
    let deleter = MemoryRecordDeleter::new();
    let outcome = analyser
        .clean(&ExemptionSet::new(), true, &cleaner, &deleter)
        .unwrap();
    assert!(outcome.changed);
    assert!(cleaner.mutated().is_empty());
    assert!(deleter.deleted().is_empty());
}

#[test]
fn group_aggregation_buckets_by_path_and_code() {
    init_logging();
    let registry = AnalyserRegistry::builtin();

    let converged = FakeRecord::composite(tags::PW_BASE).into_arc();
    let failed_a = pw_base_failed(500, "SCF did not converge");
    let failed_b = pw_base_failed(500, "SCF did not converge");
    let broken = FakeRecord::composite(tags::PW_BASE)
        .unresolved()
        .with_stale_children()
        .into_arc();

    let report = aggregate_group(
        [converged, failed_a, failed_b, broken],
        |record| registry.resolve(record),
    );

    assert_eq!(report["ROOT"]["0"]["message"], "finished OK");
    let shared = &report["iteration_01"]["500"];
    assert_eq!(shared["message"], "SCF did not converge");
    assert_eq!(shared["records"].as_array().unwrap().len(), 2);
    assert_eq!(
        report[DIAGNOSIS_FAILED_BUCKET]["-1"]["records"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}
