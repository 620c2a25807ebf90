//! Violation types and the per-response verdict

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Category of expectation check, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// HTTP status code or top-level `Status` text
    Status,
    /// Required key absent
    Presence,
    /// Value is null where a value is required
    NonNull,
    /// Value is present where null is required
    MustBeNull,
    /// Extracted sequence has no elements
    NonEmpty,
    /// Duplicate values in a sequence
    Uniqueness,
    /// Value differs from the expected value
    Equality,
}

impl CheckKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Presence => "presence",
            Self::NonNull => "non_null",
            Self::MustBeNull => "must_be_null",
            Self::NonEmpty => "non_empty",
            Self::Uniqueness => "uniqueness",
            Self::Equality => "equality",
        }
    }

    /// Human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Status => "Unexpected HTTP status or Status field",
            Self::Presence => "Required field missing",
            Self::NonNull => "Required value is null",
            Self::MustBeNull => "Value should be null",
            Self::NonEmpty => "Extracted list is empty",
            Self::Uniqueness => "Duplicate values",
            Self::Equality => "Value does not match the requested value",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    pub check: CheckKind,
    /// Field (or node path, for missing nodes) the violation is about
    pub field: String,
    /// Element index for list responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Diagnostic message
    pub message: String,
}

impl Violation {
    #[must_use]
    pub fn new(check: CheckKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check,
            field: field.into(),
            index: None,
            message: message.into(),
        }
    }

    /// Attach an element index
    #[must_use]
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of evaluating one response: pass/fail plus every violation, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub passed: bool,
    #[serde(default)]
    pub violations: Vec<Violation>,
}

impl Verdict {
    #[must_use]
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Diagnostic strings, one per violation.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// Number of violations of one kind
    #[must_use]
    pub fn count(&self, check: CheckKind) -> usize {
        self.violations.iter().filter(|v| v.check == check).count()
    }

    /// Drop violations of the given kinds and recompute `passed`.
    #[must_use]
    pub fn without(&self, ignored: &[CheckKind]) -> Self {
        Self::from_violations(
            self.violations
                .iter()
                .filter(|v| !ignored.contains(&v.check))
                .cloned()
                .collect(),
        )
    }
}
