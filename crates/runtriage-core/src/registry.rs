//! Run-type analyser registry.
//!
//! Analyser selection is an explicit registry keyed by the record's
//! declared run-type tag, not subclass dispatch. Unregistered tags fall
//! back to the generic analyser, so `resolve` never fails.

use std::collections::HashMap;
use std::sync::Arc;

use runtriage_records::ExecutionRecord;

use crate::analyser::{Diagnosable, GenericAnalyser};
use crate::analysers::{
    EpwBaseAnalyser, EpwPrepAnalyser, PhBaseAnalyser, PwBaseAnalyser, Wannier90Analyser,
};

/// Well-known run-type tags.
///
/// Tags without a factory in [`AnalyserRegistry::builtin`] resolve to the
/// generic analyser; they are listed here so checklist delegation names
/// them by constant rather than ad-hoc literals.
pub mod tags {
    pub const PW_BASE: &str = "pw.base";
    pub const PW_CALCULATION: &str = "pw.calculation";
    pub const PH_BASE: &str = "ph.base";
    pub const PH_CALCULATION: &str = "ph.calculation";
    pub const EPW_BASE: &str = "epw.base";
    pub const WANNIER90: &str = "wannier90";
    pub const EPW_PREP: &str = "epw.prep";

    // Generic-fallback tags: no dedicated analyser today.
    pub const PROJWFC_BASE: &str = "projwfc.base";
    pub const WANNIER90_BASE: &str = "wannier90.base";
    pub const PW2WANNIER90_BASE: &str = "pw2wannier90.base";
}

/// Constructs an analyser for one record. Composite analysers receive the
/// registry so they can delegate to their subprocesses' analysers.
pub type AnalyserFactory =
    fn(Arc<dyn ExecutionRecord>, Arc<AnalyserRegistry>) -> Box<dyn Diagnosable>;

/// Registry mapping run-type tags to analyser factories.
#[derive(Default)]
pub struct AnalyserRegistry {
    factories: HashMap<String, AnalyserFactory>,
}

impl AnalyserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `tag`, replacing any previous registration.
    pub fn register(&mut self, tag: &str, factory: AnalyserFactory) {
        self.factories.insert(tag.to_string(), factory);
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// The registry with every built-in analyser registered.
    pub fn builtin() -> Arc<Self> {
        let mut registry = Self::new();
        registry.register(tags::PW_BASE, |rec, _| Box::new(PwBaseAnalyser::new(rec)));
        registry.register(tags::PH_BASE, |rec, _| Box::new(PhBaseAnalyser::new(rec)));
        registry.register(tags::EPW_BASE, |rec, _| Box::new(EpwBaseAnalyser::new(rec)));
        registry.register(tags::WANNIER90, |rec, reg| {
            Box::new(Wannier90Analyser::new(rec, reg))
        });
        registry.register(tags::EPW_PREP, |rec, reg| {
            Box::new(EpwPrepAnalyser::new(rec, reg))
        });
        Arc::new(registry)
    }

    /// Build the analyser for `record` based on its declared run type.
    pub fn resolve(self: &Arc<Self>, record: Arc<dyn ExecutionRecord>) -> Box<dyn Diagnosable> {
        let tag = record.run_type().to_string();
        self.resolve_tag(&tag, record)
    }

    /// Build the analyser registered under `tag` for `record`; the
    /// generic analyser when the tag is unregistered.
    pub fn resolve_tag(
        self: &Arc<Self>,
        tag: &str,
        record: Arc<dyn ExecutionRecord>,
    ) -> Box<dyn Diagnosable> {
        match self.factories.get(tag) {
            Some(factory) => factory(record, Arc::clone(self)),
            None => Box::new(GenericAnalyser::new(record)),
        }
    }
}
