//! Batch aggregation: one status document for a whole group of runs.

use std::sync::Arc;

use runtriage_records::ExecutionRecord;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::analyser::Diagnosable;

/// Bucket collecting records whose diagnosis itself raised.
pub const DIAGNOSIS_FAILED_BUCKET: &str = "DIAGNOSIS-FAILED";

/// Deep-merge `incoming` into `base`. Objects merge key by key, arrays
/// concatenate, anything else is overwritten by the incoming value.
pub fn recursive_merge(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match base_map.get_mut(&key) {
                    Some(existing) => recursive_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(incoming_items)) => {
            base_items.extend(incoming_items);
        }
        (base, incoming) => *base = incoming,
    }
}

fn entry(path: &str, code: &str, message: &str, record_id: &str) -> Value {
    let mut codes = Map::new();
    codes.insert(
        code.to_string(),
        json!({"message": message, "records": [record_id]}),
    );
    let mut paths = Map::new();
    paths.insert(path.to_string(), Value::Object(codes));
    Value::Object(paths)
}

/// Diagnose every record in a group and fold the results into a single
/// document keyed `path -> code -> {message, records}`.
///
/// A record whose diagnosis raises lands in [`DIAGNOSIS_FAILED_BUCKET`]
/// with the error text as its message; one bad record never aborts the
/// batch.
pub fn aggregate_group<I, F>(records: I, make_analyser: F) -> Value
where
    I: IntoIterator<Item = Arc<dyn ExecutionRecord>>,
    F: Fn(Arc<dyn ExecutionRecord>) -> Box<dyn Diagnosable>,
{
    let mut report = Value::Object(Map::new());

    for record in records {
        let id = record.identity();
        let analyser = make_analyser(Arc::clone(&record));
        let piece = match analyser.get_state() {
            Ok(diagnosis) => entry(
                &diagnosis.path,
                &diagnosis.code.to_string(),
                &diagnosis.message,
                &id.to_string(),
            ),
            Err(e) => {
                warn!(record = %id, error = %e, "diagnosis failed, bucketing record");
                entry(
                    DIAGNOSIS_FAILED_BUCKET,
                    "-1",
                    &e.to_string(),
                    &id.to_string(),
                )
            }
        };
        recursive_merge(&mut report, piece);
    }

    report
}
