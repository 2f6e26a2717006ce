//! The diagnosis triple `(path, code, message)`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Sentinel path used when the failure is the root itself, or cannot be
/// localized to a deeper node.
pub const ROOT_PATH: &str = "ROOT";

/// Outcome classification of one run.
///
/// Native exit statuses come straight from the underlying run; symbolic
/// signature labels replace intentionally generic native codes after text
/// classification; `Unknown` maps to the conventional `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisCode {
    Success,
    Native(i32),
    Signature(String),
    Unknown,
}

impl DiagnosisCode {
    /// Map a native exit status onto a code; an unresolvable status is
    /// `Unknown`.
    pub fn from_exit(status: Option<i32>) -> Self {
        match status {
            Some(0) => DiagnosisCode::Success,
            Some(n) => DiagnosisCode::Native(n),
            None => DiagnosisCode::Unknown,
        }
    }
}

impl std::fmt::Display for DiagnosisCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosisCode::Success => write!(f, "0"),
            DiagnosisCode::Native(n) => write!(f, "{n}"),
            DiagnosisCode::Signature(label) => write!(f, "{label}"),
            DiagnosisCode::Unknown => write!(f, "-1"),
        }
    }
}

/// Diagnosis codes for which destructive cleanup must be refused.
pub type ExemptionSet = HashSet<DiagnosisCode>;

/// Result of diagnosing one run: where it failed, how, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// `/`-joined labels from the root to the responsible node, or
    /// [`ROOT_PATH`].
    pub path: String,
    pub code: DiagnosisCode,
    pub message: String,
}

impl Diagnosis {
    pub fn new(path: impl Into<String>, code: DiagnosisCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }

    /// The canonical success diagnosis: `("ROOT", 0, "finished OK")`.
    pub fn finished_ok() -> Self {
        Self::new(ROOT_PATH, DiagnosisCode::Success, "finished OK")
    }

    /// An undeterminable diagnosis rooted at the sentinel path.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ROOT_PATH, DiagnosisCode::Unknown, message)
    }

    pub fn is_success(&self) -> bool {
        self.code == DiagnosisCode::Success
    }

    /// Append an explanatory note to the message, keeping path and code.
    pub fn with_note(mut self, note: &str) -> Self {
        self.message = format!("{} ({note})", self.message);
        self
    }

    /// Prefix the path with a stage label. A sentinel `"ROOT"` path is
    /// replaced outright, so checklist delegation yields `label` rather
    /// than `label/ROOT`.
    pub fn prefixed(mut self, label: &str) -> Self {
        self.path = if self.path == ROOT_PATH {
            label.to_string()
        } else {
            format!("{label}/{}", self.path)
        };
        self
    }
}
