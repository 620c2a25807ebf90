//! Endpoint catalog - logical endpoint key → request shape, extraction, expectations
//!
//! The built-in catalog covers the pharmacy and billing API. A catalog file
//! (TOML, JSON, or YAML) can replace it; every catalog is validated before use.

mod builtin;

use std::collections::HashSet;
use std::path::Path;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::adapter::Extraction;
use crate::expectation::ExpectationSpec;
use crate::template::{self, Params, UnresolvedPlaceholder};

/// Characters left unescaped in query values (RFC 3986 unreserved).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Catalog loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("duplicate endpoint key: {0}")]
    DuplicateKey(String),
    #[error("endpoint {key}: {reason}")]
    InvalidExtraction { key: String, reason: String },
    #[error("endpoint {key}: field {field} is not extracted by {strategy}")]
    UnboundField {
        key: String,
        field: String,
        strategy: &'static str,
    },
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),
    #[error("endpoint {key}: {source}")]
    UnresolvedPlaceholder {
        key: String,
        source: UnresolvedPlaceholder,
    },
}

/// One query parameter; the value may hold `{param}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

/// Catalog entry for one logical endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EndpointDef {
    /// Logical endpoint key, e.g. `getAllStocks`
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Path relative to the base URL; may hold `{param}` placeholders
    pub path: String,

    /// Query parameters in request order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<QueryParam>,

    /// Default placeholder values
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,

    pub extract: Extraction,

    #[serde(default)]
    pub expect: ExpectationSpec,
}

impl EndpointDef {
    /// Bind parameters (endpoint defaults, then each layer in order) into a
    /// concrete request and expectation set.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnresolvedPlaceholder`] when the path, a query
    /// value, or an expected value names a parameter with no value.
    pub fn resolve<'a>(
        &'a self,
        layers: impl IntoIterator<Item = &'a Params>,
    ) -> Result<ResolvedEndpoint, CatalogError> {
        let params = template::layered(std::iter::once(&self.params).chain(layers));
        let wrap = |source: UnresolvedPlaceholder| CatalogError::UnresolvedPlaceholder {
            key: self.key.clone(),
            source,
        };

        let path = template::render(&self.path, &params).map_err(wrap)?;
        let query = self
            .query
            .iter()
            .map(|q| Ok((q.name.clone(), template::render(&q.value, &params).map_err(wrap)?)))
            .collect::<Result<Vec<_>, CatalogError>>()?;
        let expect = self.expect.bind(&params).map_err(wrap)?;

        Ok(ResolvedEndpoint {
            key: self.key.clone(),
            path,
            query,
            params,
            expect,
        })
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidExtraction {
            key: self.key.clone(),
            reason: reason.to_string(),
        };
        let fields = self.extract.fields();
        match &self.extract {
            Extraction::ListColumns { .. } if fields.is_empty() => {
                return Err(invalid("list_columns needs at least one field"));
            }
            Extraction::ListColumns { .. } if fields.len() > 3 => {
                return Err(invalid("list_columns takes at most three fields"));
            }
            _ => {}
        }
        if fields.iter().any(String::is_empty) {
            return Err(invalid("empty field name"));
        }

        for field in self.expect.referenced_fields() {
            if !self.extract.resolves(field) {
                return Err(CatalogError::UnboundField {
                    key: self.key.clone(),
                    field: field.to_string(),
                    strategy: self.extract.label(),
                });
            }
        }
        Ok(())
    }
}

/// An endpoint with every placeholder bound.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEndpoint {
    pub key: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub params: Params,
    pub expect: ExpectationSpec,
}

impl ResolvedEndpoint {
    /// Full request URL with percent-encoded query values.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        for (i, (name, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&utf8_percent_encode(name, QUERY_VALUE).to_string());
            url.push('=');
            url.push_str(&utf8_percent_encode(value, QUERY_VALUE).to_string());
        }
        url
    }
}

/// Validated set of endpoint definitions, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Catalog {
    pub endpoints: Vec<EndpointDef>,
}

impl Catalog {
    /// The built-in pharmacy/billing catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            endpoints: builtin::endpoints(),
        }
    }

    /// Build from definitions, validating them.
    ///
    /// # Errors
    ///
    /// Returns the first validation error.
    pub fn new(endpoints: Vec<EndpointDef>) -> Result<Self, CatalogError> {
        let catalog = Self { endpoints };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file.
    ///
    /// Detection strategy: extension first (`.toml`, `.json`, `.yaml`/`.yml`),
    /// then content sniffing (leading `{` → JSON, `[[endpoints]]` → TOML,
    /// otherwise YAML).
    ///
    /// # Errors
    ///
    /// Returns IO, parse, or validation errors.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let catalog: Self = match ext.as_str() {
            "toml" => parse_toml(&content)?,
            "json" => parse_json(&content)?,
            "yaml" | "yml" => parse_yaml(&content)?,
            _ => {
                let trimmed = content.trim_start();
                if trimmed.starts_with('{') {
                    parse_json(&content)?
                } else if trimmed.starts_with("[[endpoints]]") {
                    parse_toml(&content)?
                } else {
                    parse_yaml(&content)?
                }
            }
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check every definition and key uniqueness.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            if !seen.insert(endpoint.key.as_str()) {
                return Err(CatalogError::DuplicateKey(endpoint.key.clone()));
            }
            endpoint.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&EndpointDef> {
        self.endpoints.iter().find(|e| e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.key.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints named in `only` (in `only` order), or every endpoint when empty.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownEndpoint`] for a key not in the catalog.
    pub fn select(&self, only: &[String]) -> Result<Vec<&EndpointDef>, CatalogError> {
        if only.is_empty() {
            return Ok(self.endpoints.iter().collect());
        }
        only.iter()
            .map(|key| {
                self.get(key)
                    .ok_or_else(|| CatalogError::UnknownEndpoint(key.clone()))
            })
            .collect()
    }
}

fn parse_toml(content: &str) -> Result<Catalog, CatalogError> {
    toml::from_str(content).map_err(|e| CatalogError::Parse(format!("Invalid TOML: {e}")))
}

fn parse_json(content: &str) -> Result<Catalog, CatalogError> {
    serde_json::from_str(content).map_err(|e| CatalogError::Parse(format!("Invalid JSON: {e}")))
}

fn parse_yaml(content: &str) -> Result<Catalog, CatalogError> {
    serde_yml::from_str(content).map_err(|e| CatalogError::Parse(format!("Invalid YAML: {e}")))
}
