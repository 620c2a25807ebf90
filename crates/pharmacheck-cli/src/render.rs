//! Human and JSON renderings of suite results

use std::fmt::Write;

use serde_json::{Value, json};

use pharmacheck_core::{
    CaseOutcome, CaseReport, Catalog, SuiteReport, SuiteStatus, SuiteVerdict, Verdict,
};

/// One line per case plus indented diagnostics.
pub fn case_lines(case: &CaseReport) -> String {
    let mut out = String::new();
    match &case.outcome {
        CaseOutcome::Checked {
            status_code,
            verdict,
            ..
        } => {
            let _ = writeln!(
                out,
                "  {:<5} {} ({status_code}, {:.2}s)",
                case.label(),
                case.endpoint,
                case.elapsed
            );
            for message in verdict.messages() {
                let _ = writeln!(out, "         - {message}");
            }
        }
        CaseOutcome::Error {
            status_code,
            message,
        } => {
            let status = status_code.map_or_else(|| "no response".to_string(), |c| c.to_string());
            let _ = writeln!(out, "  {:<5} {} ({status})", case.label(), case.endpoint);
            let _ = writeln!(out, "         {message}");
        }
    }
    out
}

pub fn suite_terminal(report: &SuiteReport, verdict: &SuiteVerdict) -> String {
    let mut out = String::new();
    for case in &report.cases {
        out.push_str(&case_lines(case));
    }
    let counts = report.counts();
    let _ = writeln!(out, "\n{}: {}", verdict.status, verdict.reason);
    let _ = writeln!(
        out,
        "  Endpoints: {} total, {} passed, {} failed, {} errors",
        counts.total, counts.passed, counts.failed, counts.errors
    );
    if report.stopped_early {
        let _ = writeln!(out, "  Stopped early after first failure");
    }
    let _ = write!(out, "  Exit code: {}", verdict.exit_code);
    out
}

pub fn suite_json(report: &SuiteReport, verdict: &SuiteVerdict) -> Value {
    let cases: Vec<Value> = report
        .cases
        .iter()
        .map(|case| {
            let mut entry = json!({
                "endpoint": case.endpoint,
                "url": case.url,
                "result": case.label(),
                "status_code": case.status_code(),
                "elapsed": case.elapsed,
            });
            match &case.outcome {
                CaseOutcome::Checked { verdict, .. } => {
                    entry["violations"] = json!(verdict.violations);
                }
                CaseOutcome::Error { message, .. } => {
                    entry["error"] = json!(message);
                }
            }
            entry
        })
        .collect();

    json!({
        "verdict": verdict,
        "stats": report.counts(),
        "base_url": report.base_url,
        "stopped_early": report.stopped_early,
        "cases": cases,
    })
}

/// Result of an offline `check`.
pub fn verdict_terminal(endpoint: &str, verdict: &Verdict) -> String {
    let status = if verdict.passed {
        SuiteStatus::Pass
    } else {
        SuiteStatus::Fail
    };
    let mut out = format!("{status}: {endpoint}");
    for message in verdict.messages() {
        let _ = write!(out, "\n  - {message}");
    }
    out
}

pub fn catalog_table(catalog: &Catalog) -> String {
    let width = catalog.keys().map(str::len).max().unwrap_or(0);
    let mut out = String::new();
    for endpoint in &catalog.endpoints {
        let _ = writeln!(
            out,
            "{:<width$}  {:<13}  {}",
            endpoint.key,
            endpoint.extract.label(),
            endpoint.path
        );
    }
    let _ = write!(out, "{} endpoints", catalog.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacheck_core::{CheckKind, SuitePolicy, Violation};
    use std::collections::BTreeMap;

    fn report() -> SuiteReport {
        SuiteReport {
            base_url: "http://api.test/api".into(),
            cases: vec![
                CaseReport {
                    endpoint: "getAllStocks".into(),
                    url: "http://api.test/api/PharmacyStock/AllStockDetails".into(),
                    request_headers: BTreeMap::new(),
                    elapsed: 0.12,
                    outcome: CaseOutcome::Checked {
                        status_code: 200,
                        verdict: Verdict::from_violations(vec![]),
                        body: json!({"Status": "OK"}),
                    },
                },
                CaseReport {
                    endpoint: "getBillingSummaryByPatientId".into(),
                    url: "http://api.test/api/PharmacySales/PatientBillingSummary?patientId=114"
                        .into(),
                    request_headers: BTreeMap::new(),
                    elapsed: 0.3,
                    outcome: CaseOutcome::Checked {
                        status_code: 200,
                        verdict: Verdict::from_violations(vec![Violation::new(
                            CheckKind::Equality,
                            "PatientId",
                            "PatientId expected 114, got 115",
                        )]),
                        body: json!({"Status": "OK"}),
                    },
                },
                CaseReport {
                    endpoint: "getUsersList".into(),
                    url: "http://api.test/api/Billing/ListUsers".into(),
                    request_headers: BTreeMap::new(),
                    elapsed: 0.0,
                    outcome: CaseOutcome::Error {
                        status_code: None,
                        message: "request failed: connection refused".into(),
                    },
                },
            ],
            stopped_early: false,
        }
    }

    #[test]
    fn terminal_summary() {
        let report = report();
        let verdict = report.verdict(&SuitePolicy::default());
        insta::assert_snapshot!(suite_terminal(&report, &verdict), @r"
          PASS  getAllStocks (200, 0.12s)
          FAIL  getBillingSummaryByPatientId (200, 0.30s)
                 - PatientId expected 114, got 115
          ERROR getUsersList (no response)
                 request failed: connection refused

        FAIL: 1 of 3 endpoints failed (1 violations); 1 errors (transport/response)
          Endpoints: 3 total, 1 passed, 1 failed, 1 errors
          Exit code: 1
        ");
    }

    #[test]
    fn json_summary_has_cases_and_stats() {
        let report = report();
        let verdict = report.verdict(&SuitePolicy::default());
        let value = suite_json(&report, &verdict);
        assert_eq!(value["verdict"]["status"], "FAIL");
        assert_eq!(value["stats"]["total"], 3);
        assert_eq!(value["cases"][1]["violations"][0]["check"], "equality");
        assert_eq!(value["cases"][2]["error"], "request failed: connection refused");
        assert!(value["cases"][2]["status_code"].is_null());
    }

    #[test]
    fn check_output() {
        let verdict = Verdict::from_violations(vec![Violation::new(
            CheckKind::NonEmpty,
            "ItemId",
            "ItemId list is empty",
        )]);
        assert_eq!(
            verdict_terminal("getAllStocks", &verdict),
            "FAIL: getAllStocks\n  - ItemId list is empty"
        );
        assert_eq!(
            verdict_terminal("getAllStocks", &Verdict::from_violations(vec![])),
            "PASS: getAllStocks"
        );
    }

    #[test]
    fn catalog_table_lists_every_endpoint() {
        let table = catalog_table(&Catalog::builtin());
        assert_eq!(table.lines().count(), 19);
        assert!(table.lines().next().unwrap().starts_with("getAllStocks "));
        assert!(table.ends_with("18 endpoints"));
    }
}
