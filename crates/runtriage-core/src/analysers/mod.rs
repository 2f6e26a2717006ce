//! Per-run-type analysers registered in the builtin registry.

pub mod epw_base;
pub mod epw_prep;
pub mod ph_base;
pub mod pw_base;
pub mod wannier90;

pub use epw_base::EpwBaseAnalyser;
pub use epw_prep::EpwPrepAnalyser;
pub use ph_base::{
    stability_from_outputs, PhBaseAnalyser, StabilityProbe, StabilityVerdict,
    UNCLASSIFIED_PH_FAILURE,
};
pub use pw_base::PwBaseAnalyser;
pub use wannier90::Wannier90Analyser;
