//! HTTP file generator - converts unsuccessful cases to .http format
//!
//! Sensitive header values become `{{name}}` variables so the file can be
//! shared and replayed with an editor's REST client.

use crate::dump::is_sensitive_header;
use crate::report::{CaseOutcome, CaseReport};

/// Generate .http file content from failing or erroring cases
#[must_use]
pub fn to_http_file<'a>(cases: impl IntoIterator<Item = &'a CaseReport>) -> String {
    let cases: Vec<&CaseReport> = cases.into_iter().collect();
    let mut lines = Vec::new();

    lines.push(format!(
        "# Auto-generated reproduction cases ({} endpoints)",
        cases.len()
    ));
    lines.push(String::new());

    for (idx, case) in cases.iter().enumerate() {
        lines.push(format!("### [{idx}] {} {}", case.label(), case.endpoint));
        match &case.outcome {
            CaseOutcome::Checked {
                status_code,
                verdict,
                ..
            } => {
                lines.push(format!("# HTTP {status_code}"));
                for message in verdict.messages() {
                    lines.push(format!("# - {message}"));
                }
            }
            CaseOutcome::Error { message, .. } => {
                lines.push(format!("# error: {message}"));
            }
        }
        lines.push(request_to_http(case));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Request line and headers for one case
#[must_use]
pub fn request_to_http(case: &CaseReport) -> String {
    let mut lines = vec![format!("GET {}", case.url)];
    for (key, value) in &case.request_headers {
        if matches!(key.to_lowercase().as_str(), "host" | "content-length") {
            continue;
        }
        if is_sensitive_header(key) {
            lines.push(format!("{key}: {{{{{}}}}}", variable_name(key)));
        } else {
            lines.push(format!("{key}: {value}"));
        }
    }
    lines.join("\n")
}

/// `X-Api-Key` → `x_api_key`
fn variable_name(header: &str) -> String {
    header.to_ascii_lowercase().replace('-', "_")
}
