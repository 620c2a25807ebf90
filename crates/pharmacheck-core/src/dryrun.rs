//! Dry run plan types and config validation
//!
//! Describes what a run *would* request and check without sending anything.
//! Used for pre-flight validation and CI previews.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::catalog::{Catalog, EndpointDef};
use crate::expectation::ExpectationSpec;

// ── Plan types ──

/// Complete dry run plan: resolved requests and config warnings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DryRunPlan {
    /// Per-endpoint plan, in run order
    pub endpoints: Vec<EndpointPlan>,
    /// Config/catalog validation results
    pub validations: Vec<Validation>,
}

/// What one endpoint would send and check.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EndpointPlan {
    pub key: String,
    /// Extraction strategy label
    pub strategy: String,
    /// Fully resolved request URL
    pub url: String,
    /// One line per expectation group, e.g. "non_null: ItemId, ItemName"
    pub checks: Vec<String>,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            status,
            message: message.into(),
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "your_token",
    "YOUR_TOKEN",
    "your-api-key",
    "YOUR_API_KEY",
    "TODO",
    "CHANGEME",
    "changeme",
    "placeholder",
    "xxx",
    "XXX",
    "replace-me",
    "REPLACE_ME",
    "insert-",
    "INSERT_",
    "example",
];

fn placeholder_issue(value: &str) -> Option<String> {
    // Angle-bracket placeholders: <token>, <your-key>
    if value.contains('<') && value.contains('>') {
        return Some("contains '<...>' placeholder".to_string());
    }
    PLACEHOLDER_PATTERNS
        .iter()
        .find(|pattern| value.contains(*pattern))
        .map(|pattern| format!("contains '{pattern}', may be placeholder"))
}

/// Validate config and produce validation results.
///
/// `env` looks up environment variables (injected for testability).
#[must_use]
pub fn validate_config(
    config: &Config,
    catalog: &Catalog,
    env: impl Fn(&str) -> Option<String>,
) -> Vec<Validation> {
    let mut checks = Vec::new();

    // Base URL
    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Ok,
            format!("base_url: {}", config.base_url),
        ));
    } else {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Warning,
            format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        ));
    }

    // Authorization
    let header_auth = config
        .headers
        .keys()
        .any(|k| k.eq_ignore_ascii_case("authorization"));
    match &config.auth_env {
        Some(var) => match env(var.as_str()) {
            Some(value) => match placeholder_issue(&value) {
                Some(issue) => checks.push(Validation::new(
                    "auth",
                    ValidationStatus::Warning,
                    format!("auth: ${var} {issue}"),
                )),
                None => checks.push(Validation::new(
                    "auth",
                    ValidationStatus::Ok,
                    format!("auth: from ${var}"),
                )),
            },
            None => checks.push(Validation::new(
                "auth",
                ValidationStatus::Error,
                format!("auth: ${var} is not set"),
            )),
        },
        None if header_auth => checks.push(Validation::new(
            "auth",
            ValidationStatus::Ok,
            "auth: from headers",
        )),
        None => checks.push(Validation::new(
            "auth",
            ValidationStatus::Warning,
            "auth: no Authorization configured (set auth_env or headers.Authorization)",
        )),
    }

    // Headers, checked for placeholders
    let header_issues: Vec<String> = config
        .headers
        .iter()
        .filter_map(|(key, value)| placeholder_issue(value).map(|issue| format!("{key}: {issue}")))
        .collect();
    if header_issues.is_empty() {
        checks.push(Validation::new(
            "headers",
            ValidationStatus::Ok,
            format!("headers: {} configured", config.headers.len()),
        ));
    } else {
        for issue in header_issues {
            checks.push(Validation::new("headers", ValidationStatus::Warning, issue));
        }
    }

    // Catalog source
    let source = config
        .catalog
        .as_ref()
        .map_or_else(|| "built-in".to_string(), |p| p.display().to_string());
    checks.push(Validation::new(
        "catalog",
        ValidationStatus::Ok,
        format!("catalog: {source} ({} endpoints)", catalog.len()),
    ));

    // Selection and per-endpoint overrides must name real endpoints
    for key in &config.only {
        if catalog.get(key).is_none() {
            checks.push(Validation::new(
                "only",
                ValidationStatus::Error,
                format!("only: unknown endpoint {key}"),
            ));
        }
    }
    for key in config.endpoint_params.keys() {
        if catalog.get(key).is_none() {
            checks.push(Validation::new(
                "endpoint_params",
                ValidationStatus::Warning,
                format!("endpoint_params: unknown endpoint {key}"),
            ));
        }
    }

    checks
}

// ── Plan building ──

fn describe_checks(endpoint: &EndpointDef, expect: &ExpectationSpec) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(code) = expect.status_code {
        lines.push(format!("status_code: {code}"));
    }
    if let Some(status) = &expect.status {
        lines.push(format!("status: {status}"));
    }
    if !expect.required_fields.is_empty() {
        lines.push(format!(
            "required in {}: {}",
            endpoint.extract.node(),
            expect.required_fields.join(", ")
        ));
    }
    for nested in &expect.nested_fields {
        lines.push(format!("required in {}: {}", nested.node, nested.fields.join(", ")));
    }
    for (label, fields) in [
        ("non_null", &expect.non_null),
        ("must_be_null", &expect.must_be_null),
        ("unique", &expect.unique),
    ] {
        if !fields.is_empty() {
            lines.push(format!("{label}: {}", fields.join(", ")));
        }
    }
    for (field, value) in &expect.equals {
        let shown = value.as_str().map_or_else(|| value.to_string(), str::to_string);
        lines.push(format!("equals: {field} == {shown}"));
    }
    lines
}

/// Resolve every selected endpoint against the config without sending requests.
#[must_use]
pub fn build_plan(
    config: &Config,
    catalog: &Catalog,
    env: impl Fn(&str) -> Option<String>,
) -> DryRunPlan {
    let mut validations = validate_config(config, catalog, env);
    let mut endpoints = Vec::new();

    // unknown `only` keys are already reported by validate_config
    let selected: Vec<&EndpointDef> = if config.only.is_empty() {
        catalog.endpoints.iter().collect()
    } else {
        config.only.iter().filter_map(|key| catalog.get(key)).collect()
    };

    for endpoint in selected {
        match endpoint.resolve(config.param_layers(&endpoint.key)) {
            Ok(resolved) => endpoints.push(EndpointPlan {
                key: endpoint.key.clone(),
                strategy: endpoint.extract.label().to_string(),
                url: resolved.url(&config.base_url),
                checks: describe_checks(endpoint, &resolved.expect),
            }),
            Err(e) => validations.push(Validation::new(
                "params",
                ValidationStatus::Error,
                e.to_string(),
            )),
        }
    }

    DryRunPlan {
        endpoints,
        validations,
    }
}

// ── Display helpers ──

impl DryRunPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} endpoints, no requests sent\n",
            self.endpoints.len()
        ));

        for ep in &self.endpoints {
            lines.push(format!("{} [{}]", ep.key, ep.strategy));
            lines.push(format!("  GET {}", ep.url));
            for check in &ep.checks {
                lines.push(format!("  - {check}"));
            }
            lines.push(String::new());
        }

        // Validations
        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}
