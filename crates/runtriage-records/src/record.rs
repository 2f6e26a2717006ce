//! The execution record contract consumed by the triage core.
//!
//! An [`ExecutionRecord`] is an opaque, read-only handle to one executed
//! run persisted by an external workflow engine. Composite runs call named
//! sub-runs via labeled links; leaf runs are atomic executions with captured
//! output streams. The triage core never mutates records through this
//! trait — the only external mutation goes through the cleanup collaborators
//! in [`crate::cleanup`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordResult;

/// Unique identifier for an execution record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a new random RecordId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form (first 8 hex chars), for labels and log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One outgoing call link from a composite record to a sub-run.
///
/// `label` is the call-link label stored as provenance; it can be absent
/// for dynamically spawned sub-runs, in which case the tree builder falls
/// back to the target's process label or a synthetic name.
#[derive(Clone)]
pub struct ChildLink {
    pub label: Option<String>,
    pub record: Arc<dyn ExecutionRecord>,
}

/// Read-only handle to one executed run.
///
/// Implementations wrap the external execution-record store. All methods
/// are cheap, synchronous reads; `children` and the captured-stream getters
/// return `Err` when the underlying record has become unavailable (e.g.
/// deleted by another actor after this handle was obtained).
pub trait ExecutionRecord: Send + Sync {
    /// Stable identity of this record.
    fn identity(&self) -> RecordId;

    /// Declared run-type tag, e.g. `"ph.base"`. Used for analyser selection.
    fn run_type(&self) -> &str;

    /// Type-derived display name, when the engine recorded one.
    fn process_label(&self) -> Option<String>;

    /// True when the run terminated with a zero exit status.
    fn is_finished_ok(&self) -> bool;

    /// Native exit status, when the run reached a terminal state.
    fn exit_status(&self) -> Option<i32>;

    /// Human-readable exit message attached by the engine.
    fn exit_message(&self) -> Option<String>;

    /// True for composite runs (those that call labeled sub-runs).
    fn is_composite(&self) -> bool;

    /// Outgoing labeled child links, in link insertion order.
    ///
    /// Leaf runs return an empty list. A stale link surfaces
    /// [`crate::RecordError::ChildUnavailable`].
    fn children(&self) -> RecordResult<Vec<ChildLink>>;

    /// Captured standard output of a leaf execution.
    fn captured_stdout(&self) -> RecordResult<String>;

    /// Captured standard error of a leaf execution (scheduler stream).
    fn captured_stderr(&self) -> RecordResult<String>;

    /// Provenance extra stored on the record itself.
    fn get_extra(&self, key: &str) -> Option<String>;

    /// Provenance extra stored on the record's declared structural input.
    fn get_input_extra(&self, key: &str) -> Option<String>;

    /// Declared output field, as recorded by the engine's parsers.
    fn output_field(&self, key: &str) -> Option<serde_json::Value>;

    /// Creation time of the record; orders sibling sub-runs.
    fn created_at(&self) -> DateTime<Utc>;
}
