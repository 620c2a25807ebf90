//! Suite policy - filters violations and judges the whole run

use serde::{Deserialize, Serialize};

use super::{CheckKind, Verdict};

/// Policy for filtering violations and judging a suite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitePolicy {
    /// Check kinds whose violations are dropped before judging
    #[serde(default)]
    pub ignore_checks: Vec<CheckKind>,
}

/// Case tallies a suite verdict is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub violations: usize,
}

impl SuitePolicy {
    /// Apply the ignore list to one case verdict
    #[must_use]
    pub fn apply(&self, verdict: &Verdict) -> Verdict {
        if self.ignore_checks.is_empty() {
            return verdict.clone();
        }
        verdict.without(&self.ignore_checks)
    }

    /// Exit code: 1 on any failing case, 3 on errors only (or nothing run), else 0.
    #[must_use]
    pub fn exit_code(&self, counts: &SuiteCounts) -> i32 {
        if counts.failed > 0 {
            return 1;
        }
        // Transport/config errors with no violations → exit 3 (tool error)
        if counts.errors > 0 || counts.total == 0 {
            return 3;
        }
        0
    }

    /// Determine verdict from case tallies.
    ///
    /// PASS requires at least one case and **every** case passing.
    #[must_use]
    pub fn verdict(&self, counts: &SuiteCounts) -> SuiteVerdict {
        let exit_code = self.exit_code(counts);
        let status = if counts.total > 0 && counts.passed == counts.total {
            SuiteStatus::Pass
        } else {
            SuiteStatus::Fail
        };

        let reason = if status == SuiteStatus::Pass {
            format!("All {} endpoints passed", counts.total)
        } else if counts.total == 0 {
            "No endpoints were checked".to_string()
        } else {
            let mut parts = Vec::new();
            if counts.failed > 0 {
                parts.push(format!(
                    "{} of {} endpoints failed ({} violations)",
                    counts.failed, counts.total, counts.violations
                ));
            }
            if counts.errors > 0 {
                parts.push(format!("{} errors (transport/response)", counts.errors));
            }
            parts.join("; ")
        };

        SuiteVerdict {
            status,
            exit_code,
            reason,
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteVerdict {
    pub status: SuiteStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SuiteStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for SuiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
