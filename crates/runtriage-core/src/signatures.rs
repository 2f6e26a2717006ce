//! Ordered text-signature rules for failure reclassification.
//!
//! Some native exit statuses are intentionally generic; an analyser can
//! refine them by scanning captured output against an ordered rule list.
//! Rules are data, not branches: new signatures are added to the list,
//! evaluated top-to-bottom, first match wins.

/// One substring-signature rule: when `needle` appears in the scanned
/// text, the diagnosis code becomes the symbolic `label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureRule {
    pub needle: &'static str,
    pub label: &'static str,
}

/// Return the first rule, in declaration order, whose needle occurs in
/// `text`.
pub fn first_match<'a>(text: &str, rules: &'a [SignatureRule]) -> Option<&'a SignatureRule> {
    rules.iter().find(|rule| text.contains(rule.needle))
}

/// Scheduler-level signatures scanned in captured standard error, shared
/// across analysers.
pub const SCHEDULER_STDERR_RULES: &[SignatureRule] = &[
    SignatureRule {
        needle: "TIME LIMIT",
        label: "SCHEDULER_TIME_LIMIT",
    },
    SignatureRule {
        needle: "process killed",
        label: "KILLED_BY_SCHEDULER",
    },
];
