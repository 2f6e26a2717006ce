//! Execution record contract for runtriage (Layer 0)
//!
//! Defines the read-only [`ExecutionRecord`] handle exposed by the external
//! workflow engine's store, the destructive cleanup collaborator traits,
//! and in-memory fakes for testing.

pub mod cleanup;
pub mod error;
pub mod fakes;
pub mod record;

pub use cleanup::{RecordDeleter, WorkdirCleaner};
pub use error::{RecordError, RecordResult};
pub use record::{ChildLink, ExecutionRecord, RecordId};
