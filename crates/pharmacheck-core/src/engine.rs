//! Field expectation engine
//!
//! No I/O. Every check runs on every evaluation; violations accumulate in
//! check order and never stop the remaining checks.

use std::collections::HashSet;

use serde_json::Value;

use crate::adapter;
use crate::catalog::Catalog;
use crate::expectation::{ExpectationSpec, NestedFields};
use crate::lookup;
use crate::response::{FieldValues, NormalizedResponse};
use crate::template::{self, Params, UnresolvedPlaceholder};
use crate::verdict::{CheckKind, Verdict, Violation};

/// Integration errors: the harness asked for something the catalog cannot provide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),
    #[error("endpoint {endpoint}: {source}")]
    Placeholder {
        endpoint: String,
        source: UnresolvedPlaceholder,
    },
}

/// Looks up endpoints by key and evaluates their expectations.
#[derive(Debug, Clone)]
pub struct ExpectationEngine {
    catalog: Catalog,
}

impl ExpectationEngine {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Normalize a body using the endpoint's extraction strategy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEndpoint`] for keys not in the catalog.
    pub fn adapt(
        &self,
        key: &str,
        body: Value,
        status_code: u16,
    ) -> Result<NormalizedResponse, EngineError> {
        let endpoint = self
            .catalog
            .get(key)
            .ok_or_else(|| EngineError::UnknownEndpoint(key.to_string()))?;
        Ok(adapter::adapt(body, status_code, &endpoint.extract))
    }

    /// Evaluate with the endpoint's default parameters.
    ///
    /// # Errors
    ///
    /// See [`Self::evaluate_with`].
    pub fn evaluate(&self, key: &str, response: &NormalizedResponse) -> Result<Verdict, EngineError> {
        self.evaluate_with(key, response, &Params::new())
    }

    /// Evaluate with parameter overrides layered over the endpoint defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEndpoint`] for keys not in the catalog and
    /// [`EngineError::Placeholder`] when an expected value names a parameter
    /// with no value.
    pub fn evaluate_with(
        &self,
        key: &str,
        response: &NormalizedResponse,
        overrides: &Params,
    ) -> Result<Verdict, EngineError> {
        let endpoint = self
            .catalog
            .get(key)
            .ok_or_else(|| EngineError::UnknownEndpoint(key.to_string()))?;
        let params = template::layered([&endpoint.params, overrides]);
        let spec = endpoint
            .expect
            .bind(&params)
            .map_err(|source| EngineError::Placeholder {
                endpoint: key.to_string(),
                source,
            })?;
        Ok(evaluate(&spec, response))
    }
}

/// Evaluate a bound expectation spec against a normalized response.
#[must_use]
pub fn evaluate(spec: &ExpectationSpec, response: &NormalizedResponse) -> Verdict {
    let mut violations = Vec::new();

    // ── Check 1: HTTP status and Status text ──
    check_status(spec, response, &mut violations);

    // ── Check 2: Presence ──
    if !spec.required_fields.is_empty() {
        check_presence(
            response.raw_body(),
            response.node(),
            &spec.required_fields,
            false,
            &mut violations,
        );
    }
    for NestedFields { node, fields } in &spec.nested_fields {
        check_presence(response.raw_body(), node, fields, true, &mut violations);
    }

    // ── Check 3: Non-null / must-be-null ──
    for field in &spec.non_null {
        match response.field(field) {
            Some(FieldValues::Scalar(v)) if v.is_null() => {
                violations.push(Violation::new(
                    CheckKind::NonNull,
                    field,
                    format!("{field} is null"),
                ));
            }
            Some(FieldValues::Scalar(_)) => {}
            Some(FieldValues::Sequence(values)) => {
                for (i, _) in values.iter().enumerate().filter(|(_, v)| v.is_null()) {
                    violations.push(
                        Violation::new(CheckKind::NonNull, field, format!("{field} at index {i} is null"))
                            .at(i),
                    );
                }
            }
            None => violations.push(not_extracted(CheckKind::NonNull, field)),
        }
    }
    for field in &spec.must_be_null {
        match response.field(field) {
            Some(FieldValues::Scalar(v)) if !v.is_null() => {
                violations.push(Violation::new(
                    CheckKind::MustBeNull,
                    field,
                    format!("{field} should be null, got {}", display(v)),
                ));
            }
            Some(FieldValues::Scalar(_)) => {}
            Some(FieldValues::Sequence(values)) => {
                for (i, v) in values.iter().enumerate().filter(|(_, v)| !v.is_null()) {
                    violations.push(
                        Violation::new(
                            CheckKind::MustBeNull,
                            field,
                            format!("{field} at index {i} should be null, got {}", display(v)),
                        )
                        .at(i),
                    );
                }
            }
            None => violations.push(not_extracted(CheckKind::MustBeNull, field)),
        }
    }

    // ── Check 4: Non-empty ──
    for field in &spec.non_null {
        if let Some(FieldValues::Sequence(values)) = response.field(field) {
            if values.is_empty() {
                violations.push(Violation::new(
                    CheckKind::NonEmpty,
                    field,
                    format!("{field} list is empty"),
                ));
            }
        }
    }

    // ── Check 5: Uniqueness ──
    for field in &spec.unique {
        match response.field(field) {
            Some(FieldValues::Sequence(values)) => {
                let distinct: HashSet<String> = values.iter().map(|v| distinct_key(v)).collect();
                if distinct.len() != values.len() {
                    violations.push(Violation::new(
                        CheckKind::Uniqueness,
                        field,
                        format!("values in {field} are not unique"),
                    ));
                }
            }
            // a single value is trivially unique
            Some(FieldValues::Scalar(_)) => {}
            None => violations.push(not_extracted(CheckKind::Uniqueness, field)),
        }
    }

    // ── Check 6: Equality ──
    for (field, expected) in &spec.equals {
        match response.field(field) {
            Some(FieldValues::Scalar(actual)) => {
                if !loosely_equal(actual, expected) {
                    violations.push(Violation::new(
                        CheckKind::Equality,
                        field,
                        format!(
                            "{field} expected {}, got {}",
                            display(expected),
                            display(actual)
                        ),
                    ));
                }
            }
            Some(FieldValues::Sequence(values)) => {
                for (i, actual) in values.iter().enumerate() {
                    if !loosely_equal(actual, expected) {
                        violations.push(
                            Violation::new(
                                CheckKind::Equality,
                                field,
                                format!(
                                    "{field} at index {i} expected {}, got {}",
                                    display(expected),
                                    display(actual)
                                ),
                            )
                            .at(i),
                        );
                    }
                }
            }
            None => violations.push(not_extracted(CheckKind::Equality, field)),
        }
    }

    Verdict::from_violations(violations)
}

fn check_status(spec: &ExpectationSpec, response: &NormalizedResponse, out: &mut Vec<Violation>) {
    if let Some(expected) = spec.status_code {
        if response.status_code() != expected {
            out.push(Violation::new(
                CheckKind::Status,
                "status_code",
                format!(
                    "expected HTTP status {expected}, got {}",
                    response.status_code()
                ),
            ));
        }
    }
    if let Some(expected) = &spec.status {
        if response.status() != Some(expected.as_str()) {
            out.push(Violation::new(
                CheckKind::Status,
                "Status",
                format!(
                    "Status expected {expected}, got {}",
                    response.status().unwrap_or("nothing")
                ),
            ));
        }
    }
}

/// Presence of `fields` on the node at `path`: object keys, or keys on every
/// element of an array. `report_empty` flags an empty array node.
fn check_presence(
    body: &Value,
    path: &str,
    fields: &[String],
    report_empty: bool,
    out: &mut Vec<Violation>,
) {
    let node_name = if path.is_empty() { "<root>" } else { path };
    match lookup::node(body, path) {
        None | Some(Value::Null) => out.push(Violation::new(
            CheckKind::Presence,
            node_name,
            format!("node {node_name} is missing"),
        )),
        Some(Value::Array(items)) => {
            if items.is_empty() && report_empty {
                out.push(Violation::new(
                    CheckKind::Presence,
                    node_name,
                    format!("node {node_name} is empty"),
                ));
            }
            for (i, item) in items.iter().enumerate() {
                for field in fields {
                    if item.get(field).is_none() {
                        out.push(
                            Violation::new(
                                CheckKind::Presence,
                                field,
                                format!("missing field {field} at index {i}"),
                            )
                            .at(i),
                        );
                    }
                }
            }
        }
        Some(Value::Object(map)) => {
            for field in fields.iter().filter(|f| !map.contains_key(f.as_str())) {
                out.push(Violation::new(
                    CheckKind::Presence,
                    field,
                    format!("missing field {field}"),
                ));
            }
        }
        Some(_) => out.push(Violation::new(
            CheckKind::Presence,
            node_name,
            format!("node {node_name} is not an object or array"),
        )),
    }
}

fn not_extracted(check: CheckKind, field: &str) -> Violation {
    Violation::new(check, field, format!("{field} is not extracted for this endpoint"))
}

/// Render a value for diagnostics: strings unquoted, everything else as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Canonical key for distinctness: numbers compare numerically, strings by
/// exact text, and the two never collide.
fn distinct_key(value: &Value) -> String {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => format!("n:{i}"),
            (None, Some(u), _) => format!("n:{u}"),
            (None, None, Some(f)) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                #[allow(clippy::cast_possible_truncation)]
                let i = f as i64;
                format!("n:{i}")
            }
            _ => format!("n:{n}"),
        },
        Value::String(s) => format!("s:{s}"),
        other => other.to_string(),
    }
}

/// Equality with representation coercion: `1 == 1.0`, `"114" == 114`,
/// `"true" == true`. Null only equals null.
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => s
            .trim()
            .parse::<serde_json::Number>()
            .is_ok_and(|parsed| numbers_equal(&parsed, n)),
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            s.trim() == b.to_string()
        }
        _ => false,
    }
}

/// Integers compare exactly; floats only when a side is not an integer.
fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    match (integral(a), integral(b)) {
        (Some(x), Some(y)) => x == y,
        (Some(_), None) | (None, Some(_)) | (None, None) => a.as_f64() == b.as_f64(),
    }
}

/// Exact integer value, including floats with no fractional part.
fn integral(n: &serde_json::Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i128::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(i128::from(u));
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
        .map(|f| {
            #[allow(clippy::cast_possible_truncation)]
            let i = f as i64;
            i128::from(i)
        })
}
