//! Verdict module - violation classification and suite policy

mod policy;
mod violation;

pub use policy::{SuiteCounts, SuitePolicy, SuiteStatus, SuiteVerdict};
pub use violation::{CheckKind, Verdict, Violation};
