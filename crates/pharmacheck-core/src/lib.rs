//! pharmacheck-core: Response normalization and expectation checks for the
//! hospital pharmacy/billing API
//!
//! This crate turns raw JSON bodies into fixed-shape normalized responses,
//! evaluates declarative per-endpoint expectations against them, and holds
//! the endpoint catalog, configuration, and reporting types the runner and
//! CLI share. No network I/O happens here.

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod dryrun;
pub mod dump;
pub mod engine;
pub mod expectation;
pub mod lookup;
pub mod report;
pub mod repro;
pub mod response;
pub mod schema;
pub mod template;
pub mod verdict;

pub use adapter::{Extraction, adapt};
pub use catalog::{Catalog, CatalogError, EndpointDef, QueryParam, ResolvedEndpoint};
pub use config::{Config, ConfigError};
pub use dryrun::DryRunPlan;
pub use dump::{DumpError, DumpIndex};
pub use engine::{EngineError, ExpectationEngine, evaluate};
pub use expectation::{ExpectationSpec, NestedFields};
pub use report::{CaseOutcome, CaseReport, SuiteReport};
pub use repro::to_http_file;
pub use response::{FieldValues, NormalizedResponse, Slot, SlotId};
pub use template::Params;
pub use verdict::{
    CheckKind, SuiteCounts, SuitePolicy, SuiteStatus, SuiteVerdict, Verdict, Violation,
};
