//! In-memory fakes for the record contract (testing only)
//!
//! Provides `FakeRecord`, `MemoryWorkdirCleaner`, and `MemoryRecordDeleter`
//! that satisfy the trait contracts without any external store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::cleanup::{RecordDeleter, WorkdirCleaner};
use crate::error::{RecordError, RecordResult};
use crate::record::{ChildLink, ExecutionRecord, RecordId};

/// Monotonic tick so fakes built in sequence get ascending creation times.
static CLOCK_TICK: AtomicI64 = AtomicI64::new(0);

fn next_tick() -> DateTime<Utc> {
    let tick = CLOCK_TICK.fetch_add(1, Ordering::SeqCst);
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(tick)
}

/// Builder-style fake execution record.
#[derive(Clone)]
pub struct FakeRecord {
    id: RecordId,
    run_type: String,
    process_label: Option<String>,
    finished_ok: bool,
    exit_status: Option<i32>,
    exit_message: Option<String>,
    composite: bool,
    children: Vec<ChildLink>,
    stdout: String,
    stderr: String,
    extras: HashMap<String, String>,
    input_extras: HashMap<String, String>,
    outputs: HashMap<String, serde_json::Value>,
    created_at: DateTime<Utc>,
    stale_children: bool,
}

impl FakeRecord {
    /// A successful atomic leaf execution.
    pub fn leaf(run_type: &str) -> Self {
        Self {
            id: RecordId::new(),
            run_type: run_type.to_string(),
            process_label: None,
            finished_ok: true,
            exit_status: Some(0),
            exit_message: None,
            composite: false,
            children: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            extras: HashMap::new(),
            input_extras: HashMap::new(),
            outputs: HashMap::new(),
            created_at: next_tick(),
            stale_children: false,
        }
    }

    /// A successful composite run with no children yet.
    pub fn composite(run_type: &str) -> Self {
        let mut rec = Self::leaf(run_type);
        rec.composite = true;
        rec
    }

    /// Mark the run failed with a native exit status and message.
    pub fn failed(mut self, status: i32, message: &str) -> Self {
        self.finished_ok = false;
        self.exit_status = Some(status);
        self.exit_message = Some(message.to_string());
        self
    }

    /// Mark the run as not finished ok without a resolvable exit status.
    pub fn unresolved(mut self) -> Self {
        self.finished_ok = false;
        self.exit_status = None;
        self.exit_message = None;
        self
    }

    pub fn with_process_label(mut self, label: &str) -> Self {
        self.process_label = Some(label.to_string());
        self
    }

    pub fn with_stdout(mut self, text: &str) -> Self {
        self.stdout = text.to_string();
        self
    }

    pub fn with_stderr(mut self, text: &str) -> Self {
        self.stderr = text.to_string();
        self
    }

    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.extras.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_input_extra(mut self, key: &str, value: &str) -> Self {
        self.input_extras.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_output(mut self, key: &str, value: serde_json::Value) -> Self {
        self.outputs.insert(key.to_string(), value);
        self
    }

    /// Override the creation time (for sibling-ordering tests).
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Attach a labeled child link.
    pub fn child(mut self, label: &str, record: Arc<dyn ExecutionRecord>) -> Self {
        self.composite = true;
        self.children.push(ChildLink {
            label: Some(label.to_string()),
            record,
        });
        self
    }

    /// Attach a child link without a call label.
    pub fn unlabeled_child(mut self, record: Arc<dyn ExecutionRecord>) -> Self {
        self.composite = true;
        self.children.push(ChildLink {
            label: None,
            record,
        });
        self
    }

    /// Make `children()` fail, simulating a snapshot gone stale.
    pub fn with_stale_children(mut self) -> Self {
        self.stale_children = true;
        self
    }

    pub fn id(&self) -> RecordId {
        self.id.clone()
    }

    pub fn into_arc(self) -> Arc<dyn ExecutionRecord> {
        Arc::new(self)
    }
}

impl ExecutionRecord for FakeRecord {
    fn identity(&self) -> RecordId {
        self.id.clone()
    }

    fn run_type(&self) -> &str {
        &self.run_type
    }

    fn process_label(&self) -> Option<String> {
        self.process_label.clone()
    }

    fn is_finished_ok(&self) -> bool {
        self.finished_ok
    }

    fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }

    fn exit_message(&self) -> Option<String> {
        self.exit_message.clone()
    }

    fn is_composite(&self) -> bool {
        self.composite
    }

    fn children(&self) -> RecordResult<Vec<ChildLink>> {
        if self.stale_children {
            return Err(RecordError::ChildUnavailable {
                id: self.id.to_string(),
            });
        }
        Ok(self.children.clone())
    }

    fn captured_stdout(&self) -> RecordResult<String> {
        Ok(self.stdout.clone())
    }

    fn captured_stderr(&self) -> RecordResult<String> {
        Ok(self.stderr.clone())
    }

    fn get_extra(&self, key: &str) -> Option<String> {
        self.extras.get(key).cloned()
    }

    fn get_input_extra(&self, key: &str) -> Option<String> {
        self.input_extras.get(key).cloned()
    }

    fn output_field(&self, key: &str) -> Option<serde_json::Value> {
        self.outputs.get(key).cloned()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ---------------------------------------------------------------------------
// MemoryWorkdirCleaner
// ---------------------------------------------------------------------------

/// In-memory workdir cleaner that fabricates one scratch location per call
/// and tracks real (non-dry-run) mutations.
#[derive(Debug, Default)]
pub struct MemoryWorkdirCleaner {
    calls: Mutex<u32>,
    mutations: Mutex<Vec<String>>,
    fail: bool,
}

impl MemoryWorkdirCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cleaner whose every call fails with a backend error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Total calls received, dry-run included.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    /// Locations actually mutated (dry-run calls never appear here).
    pub fn mutated(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }
}

impl WorkdirCleaner for MemoryWorkdirCleaner {
    fn clean_working_directory(
        &self,
        record: &dyn ExecutionRecord,
        dry_run: bool,
    ) -> RecordResult<Vec<String>> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(RecordError::Backend("scratch filesystem offline".to_string()));
        }
        let location = format!("remote:/scratch/{}", record.identity().short());
        if !dry_run {
            self.mutations.lock().unwrap().push(location.clone());
        }
        Ok(vec![location])
    }
}

// ---------------------------------------------------------------------------
// MemoryRecordDeleter
// ---------------------------------------------------------------------------

/// In-memory deleter that echoes the requested ids and tracks real deletions.
#[derive(Debug, Default)]
pub struct MemoryRecordDeleter {
    calls: Mutex<u32>,
    deleted: Mutex<Vec<RecordId>>,
    fail: bool,
}

impl MemoryRecordDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A deleter whose every call fails with a backend error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Total calls received, dry-run included.
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    /// Ids actually deleted (dry-run calls never appear here).
    pub fn deleted(&self) -> Vec<RecordId> {
        self.deleted.lock().unwrap().clone()
    }
}

impl RecordDeleter for MemoryRecordDeleter {
    fn delete_subtree(
        &self,
        ids: &[RecordId],
        dry_run: bool,
    ) -> RecordResult<(Vec<RecordId>, Vec<String>)> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(RecordError::Backend("store rejected deletion".to_string()));
        }
        if !dry_run {
            self.deleted.lock().unwrap().extend(ids.iter().cloned());
        }
        Ok((ids.to_vec(), Vec::new()))
    }
}
