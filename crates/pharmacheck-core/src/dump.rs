//! Full request/response dump to JSONL files
//!
//! Writes every case (not just failures) to per-endpoint JSONL files
//! for post-hoc analysis, debugging, and audit trails.
//!
//! ```text
//! .pharmacheck/dumps/
//! ├── getAllStocks.jsonl
//! ├── getMainStore.jsonl
//! └── index.json
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::report::CaseReport;

/// Headers that should be masked in dumps for security.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "set-cookie",
    "proxy-authorization",
];

/// Mask value for redacted headers.
pub const MASK: &str = "***";

/// Summary of a dump operation, written as `index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpIndex {
    /// Total cases dumped
    pub total: u64,
    /// Per-endpoint file listing
    pub endpoints: Vec<DumpEndpointEntry>,
    /// Directory where files were written
    pub dump_dir: PathBuf,
}

/// An entry in the dump index for one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpEndpointEntry {
    /// Logical endpoint key
    pub endpoint: String,
    /// Filename within dump directory
    pub file: String,
    /// Number of cases in this file
    pub count: u64,
    /// Passing cases in this file
    pub passed: u64,
}

/// Write all cases to per-endpoint JSONL files.
///
/// Returns the dump index on success.
///
/// # Errors
///
/// Returns error if dump directory cannot be created or files cannot be written.
pub fn write_dump(
    cases: &[CaseReport],
    dump_dir: &Path,
    mask_headers: bool,
) -> Result<DumpIndex, DumpError> {
    std::fs::create_dir_all(dump_dir)
        .map_err(|e| DumpError::Io(format!("create {}: {e}", dump_dir.display())))?;

    // Group by endpoint; BTreeMap keeps output deterministic
    let mut groups: BTreeMap<&str, Vec<&CaseReport>> = BTreeMap::new();
    for case in cases {
        groups.entry(case.endpoint.as_str()).or_default().push(case);
    }

    let mut entries = Vec::new();
    let mut total: u64 = 0;

    for (endpoint, cases) in groups {
        let filename = sanitize_filename(endpoint);
        let filepath = dump_dir.join(&filename);

        let file = std::fs::File::create(&filepath)
            .map_err(|e| DumpError::Io(format!("create {}: {e}", filepath.display())))?;
        let mut writer = std::io::BufWriter::new(file);

        let count = cases.len() as u64;
        total += count;

        for case in &cases {
            let line = if mask_headers {
                serde_json::to_string(&mask_case(case))
            } else {
                serde_json::to_string(case)
            }
            .map_err(|e| DumpError::Serialize(e.to_string()))?;
            writer
                .write_all(line.as_bytes())
                .map_err(|e| DumpError::Io(format!("write {}: {e}", filepath.display())))?;
            writer
                .write_all(b"\n")
                .map_err(|e| DumpError::Io(format!("write {}: {e}", filepath.display())))?;
        }

        writer
            .flush()
            .map_err(|e| DumpError::Io(format!("flush {}: {e}", filepath.display())))?;

        entries.push(DumpEndpointEntry {
            endpoint: endpoint.to_string(),
            file: filename,
            count,
            passed: cases.iter().filter(|c| c.passed()).count() as u64,
        });
    }

    let index = DumpIndex {
        total,
        endpoints: entries,
        dump_dir: dump_dir.to_path_buf(),
    };

    // Write index.json
    let index_path = dump_dir.join("index.json");
    let index_json =
        serde_json::to_string_pretty(&index).map_err(|e| DumpError::Serialize(e.to_string()))?;
    std::fs::write(&index_path, index_json)
        .map_err(|e| DumpError::Io(format!("write {}: {e}", index_path.display())))?;

    Ok(index)
}

/// Maximum characters kept from the endpoint key in the filename.
const MAX_FILENAME_LEN: usize = 200;

/// Convert an endpoint key to a safe filename.
///
/// "getAllStocks" → "getAllStocks.jsonl", "../x y" → ".._x_y.jsonl"
fn sanitize_filename(endpoint: &str) -> String {
    let sanitized: String = endpoint
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' => c,
            _ => '_',
        })
        .collect();
    format!("{sanitized}.jsonl")
}

/// Returns true if the header name matches a known sensitive header (case-insensitive).
#[must_use]
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

/// Mask sensitive request headers in a case.
fn mask_case(case: &CaseReport) -> CaseReport {
    let mut masked = case.clone();
    for (key, value) in &mut masked.request_headers {
        if is_sensitive_header(key) {
            *value = MASK.to_string();
        }
    }
    masked
}

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CaseOutcome;
    use crate::verdict::Verdict;

    fn case(endpoint: &str, passed: bool) -> CaseReport {
        let verdict = if passed {
            Verdict::from_violations(vec![])
        } else {
            Verdict::from_violations(vec![crate::verdict::Violation::new(
                crate::verdict::CheckKind::NonEmpty,
                "ItemId",
                "ItemId list is empty",
            )])
        };
        CaseReport {
            endpoint: endpoint.into(),
            url: format!("https://healthapp.yaksha.com/api/{endpoint}"),
            request_headers: BTreeMap::from([
                ("Authorization".into(), "Basic secret-token".into()),
                ("Content-Type".into(), "application/json".into()),
            ]),
            elapsed: 0.05,
            outcome: CaseOutcome::Checked {
                status_code: 200,
                verdict,
                body: serde_json::json!({"Status": "OK", "Results": []}),
            },
        }
    }

    #[test]
    fn sanitize_simple() {
        assert_eq!(sanitize_filename("getAllStocks"), "getAllStocks.jsonl");
    }

    #[test]
    fn sanitize_path_like_key() {
        assert_eq!(sanitize_filename("../x y"), ".._x_y.jsonl");
    }

    #[test]
    fn mask_authorization_header() {
        let masked = mask_case(&case("getAllStocks", true));
        assert_eq!(masked.request_headers["Authorization"], "***");
        assert_eq!(masked.request_headers["Content-Type"], "application/json");
    }

    #[test]
    fn mask_case_insensitive() {
        let mut c = case("getAllStocks", true);
        c.request_headers.insert("x-api-key".into(), "my-secret".into());
        let masked = mask_case(&c);
        assert_eq!(masked.request_headers["x-api-key"], "***");
    }

    #[test]
    fn no_mask_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_dump(&[case("getAllStocks", true)], dir.path(), false).unwrap();
        assert_eq!(index.total, 1);

        // Read back and verify header is NOT masked
        let file_path = dir.path().join(&index.endpoints[0].file);
        let content = std::fs::read_to_string(file_path).unwrap();
        let parsed: CaseReport = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed.request_headers["Authorization"], "Basic secret-token");
    }

    #[test]
    fn write_dump_basic() {
        let dir = tempfile::tempdir().unwrap();
        let cases = vec![
            case("getMainStore", true),
            case("getAllStocks", true),
            case("getAllStocks", false),
        ];

        let index = write_dump(&cases, dir.path(), true).unwrap();

        assert_eq!(index.total, 3);
        assert_eq!(index.endpoints.len(), 2);

        // Entries sorted by endpoint key
        assert_eq!(index.endpoints[0].endpoint, "getAllStocks");
        assert_eq!(index.endpoints[0].count, 2);
        assert_eq!(index.endpoints[0].passed, 1);
        assert_eq!(index.endpoints[1].endpoint, "getMainStore");

        for entry in &index.endpoints {
            let path = dir.path().join(&entry.file);
            let content = std::fs::read_to_string(&path).unwrap();
            let lines: Vec<_> = content.lines().collect();
            assert_eq!(lines.len(), entry.count as usize, "{}", entry.file);
            for line in lines {
                let parsed: CaseReport = serde_json::from_str(line).unwrap();
                assert_eq!(parsed.request_headers["Authorization"], MASK);
            }
        }

        let index_content = std::fs::read_to_string(dir.path().join("index.json")).unwrap();
        let parsed: DumpIndex = serde_json::from_str(&index_content).unwrap();
        assert_eq!(parsed.total, 3);
    }

    #[test]
    fn write_dump_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_dump(&[], dir.path(), true).unwrap();
        assert_eq!(index.total, 0);
        assert!(index.endpoints.is_empty());
        // index.json should still exist
        assert!(dir.path().join("index.json").exists());
    }
}
