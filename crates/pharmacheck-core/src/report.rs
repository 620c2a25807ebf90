//! Per-endpoint case reports and suite totals

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::verdict::{SuiteCounts, SuitePolicy, SuiteVerdict, Verdict};

/// Result of one endpoint call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    /// Logical endpoint key
    pub endpoint: String,
    /// Request URL as sent
    pub url: String,
    /// Request headers as sent (unmasked)
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
    /// Seconds from send to full body
    pub elapsed: f64,
    #[serde(flatten)]
    pub outcome: CaseOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// A JSON body arrived and was evaluated.
    Checked {
        status_code: u16,
        verdict: Verdict,
        body: Value,
    },
    /// Transport failure, non-JSON body, or unresolvable request.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        message: String,
    },
}

impl CaseReport {
    #[must_use]
    pub fn verdict(&self) -> Option<&Verdict> {
        match &self.outcome {
            CaseOutcome::Checked { verdict, .. } => Some(verdict),
            CaseOutcome::Error { .. } => None,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match &self.outcome {
            CaseOutcome::Checked { status_code, .. } => Some(*status_code),
            CaseOutcome::Error { status_code, .. } => *status_code,
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict().is_some_and(|v| v.passed)
    }

    /// Evaluated with at least one violation
    #[must_use]
    pub fn failed(&self) -> bool {
        self.verdict().is_some_and(|v| !v.passed)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, CaseOutcome::Error { .. })
    }

    /// Passing, failing, or erroring, as a fixed-width label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match &self.outcome {
            CaseOutcome::Checked { verdict, .. } if verdict.passed => "PASS",
            CaseOutcome::Checked { .. } => "FAIL",
            CaseOutcome::Error { .. } => "ERROR",
        }
    }
}

/// Every case of one run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub base_url: String,
    pub cases: Vec<CaseReport>,
    /// Set when the run ended after the first failing case
    #[serde(default)]
    pub stopped_early: bool,
}

impl SuiteReport {
    #[must_use]
    pub fn counts(&self) -> SuiteCounts {
        SuiteCounts {
            total: self.cases.len(),
            passed: self.cases.iter().filter(|c| c.passed()).count(),
            failed: self.cases.iter().filter(|c| c.failed()).count(),
            errors: self.cases.iter().filter(|c| c.is_error()).count(),
            violations: self
                .cases
                .iter()
                .filter_map(CaseReport::verdict)
                .map(|v| v.violations.len())
                .sum(),
        }
    }

    #[must_use]
    pub fn verdict(&self, policy: &SuitePolicy) -> SuiteVerdict {
        policy.verdict(&self.counts())
    }

    /// Cases that failed or errored
    pub fn unsuccessful(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.passed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{CheckKind, SuiteStatus, Violation};
    use serde_json::json;

    fn checked(endpoint: &str, violations: Vec<Violation>) -> CaseReport {
        CaseReport {
            endpoint: endpoint.into(),
            url: format!("http://localhost/api/{endpoint}"),
            request_headers: BTreeMap::new(),
            elapsed: 0.05,
            outcome: CaseOutcome::Checked {
                status_code: 200,
                verdict: Verdict::from_violations(violations),
                body: json!({"Status": "OK"}),
            },
        }
    }

    fn errored(endpoint: &str) -> CaseReport {
        CaseReport {
            endpoint: endpoint.into(),
            url: String::new(),
            request_headers: BTreeMap::new(),
            elapsed: 0.0,
            outcome: CaseOutcome::Error {
                status_code: None,
                message: "connection refused".into(),
            },
        }
    }

    fn null_violation() -> Violation {
        Violation::new(CheckKind::NonNull, "ItemId", "ItemId at index 0 is null").at(0)
    }

    #[test]
    fn counts_classify_cases() {
        let report = SuiteReport {
            base_url: "http://localhost/api".into(),
            cases: vec![
                checked("getAllStocks", vec![]),
                checked("getMainStore", vec![null_violation(), null_violation()]),
                errored("getUsersList"),
            ],
            stopped_early: false,
        };
        let counts = report.counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.violations, 2);
        assert_eq!(report.unsuccessful().count(), 2);

        let verdict = report.verdict(&SuitePolicy::default());
        assert_eq!(verdict.status, SuiteStatus::Fail);
        assert_eq!(verdict.exit_code, 1);
    }

    #[test]
    fn labels() {
        assert_eq!(checked("a", vec![]).label(), "PASS");
        assert_eq!(checked("a", vec![null_violation()]).label(), "FAIL");
        assert_eq!(errored("a").label(), "ERROR");
    }

    #[test]
    fn outcome_is_flattened_in_json() {
        let value = serde_json::to_value(errored("getUsersList")).unwrap();
        assert_eq!(value["outcome"], "error");
        assert_eq!(value["message"], "connection refused");
        assert!(value.get("status_code").is_none());
    }
}
