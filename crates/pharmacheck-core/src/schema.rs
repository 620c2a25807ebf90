//! JSON Schema export for catalog files
//!
//! Editors and CI can validate hand-written catalogs against this schema
//! before `pharmacheck` loads them.

use crate::catalog::Catalog;
use crate::dryrun::DryRunPlan;

/// JSON Schema for catalog files.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(Catalog);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}

/// JSON Schema for `pharmacheck plan --output json`.
#[must_use]
pub fn generate_plan_schema() -> String {
    let schema = schemars::schema_for!(DryRunPlan);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
