//! Declarative expectation rules for one endpoint

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::{self, Params, UnresolvedPlaceholder};

/// Presence rule for a sub-structure other than the extraction node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NestedFields {
    /// Dot-separated node path from the body root
    pub node: String,
    /// Keys required on the node (or on every element if it is an array)
    pub fields: Vec<String>,
}

/// Expectations evaluated against a normalized response.
///
/// Field names refer to the fields bound by the endpoint's extraction, or
/// to record keys when the extraction keeps whole records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExpectationSpec {
    /// Expected HTTP status code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Expected top-level `Status` text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Keys that must exist on the extraction node (every element for arrays)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,

    /// Presence rules for other sub-structures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_fields: Vec<NestedFields>,

    /// Fields whose values must be non-null (sequences must also be non-empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_null: Vec<String>,

    /// Fields whose values must all be null
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_be_null: Vec<String>,

    /// Fields whose values must be pairwise distinct
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique: Vec<String>,

    /// Field → expected value. String values may hold `{param}` placeholders.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub equals: BTreeMap<String, Value>,
}

impl ExpectationSpec {
    /// Every field name the value checks refer to, deduplicated, in first-use order.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let names = self
            .non_null
            .iter()
            .chain(&self.must_be_null)
            .chain(&self.unique)
            .chain(self.equals.keys());
        for name in names {
            if !seen.contains(&name.as_str()) {
                seen.push(name);
            }
        }
        seen
    }

    /// Placeholders used by expected values.
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        self.equals
            .values()
            .filter_map(Value::as_str)
            .flat_map(template::placeholders)
            .collect()
    }

    /// Substitute request parameters into expected values.
    ///
    /// # Errors
    ///
    /// Returns the first placeholder with no parameter value.
    pub fn bind(&self, params: &Params) -> Result<Self, UnresolvedPlaceholder> {
        let mut bound = self.clone();
        for value in bound.equals.values_mut() {
            if let Value::String(s) = value {
                *s = template::render(s, params)?;
            }
        }
        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_toml_spec() {
        let toml = r#"
status_code = 200
status = "OK"
non_null = ["PatientId", "TotalDue"]

[equals]
PatientId = "{patientId}"
"#;
        let spec: ExpectationSpec = toml::from_str(toml).unwrap();
        assert_eq!(spec.status_code, Some(200));
        assert_eq!(spec.non_null, vec!["PatientId", "TotalDue"]);
        assert_eq!(spec.equals["PatientId"], json!("{patientId}"));
        assert!(spec.unique.is_empty());
    }

    #[test]
    fn bind_substitutes_string_values() {
        let mut spec = ExpectationSpec::default();
        spec.equals.insert("PatientId".into(), json!("{patientId}"));
        spec.equals.insert("IsActive".into(), json!(true));
        let params = Params::from([("patientId".to_string(), "114".to_string())]);

        let bound = spec.bind(&params).unwrap();
        assert_eq!(bound.equals["PatientId"], json!("114"));
        assert_eq!(bound.equals["IsActive"], json!(true));
        // original left as-is
        assert_eq!(spec.equals["PatientId"], json!("{patientId}"));
    }

    #[test]
    fn bind_reports_missing_param() {
        let mut spec = ExpectationSpec::default();
        spec.equals.insert("SchemeId".into(), json!("{schemeId}"));
        assert_eq!(spec.bind(&Params::new()).unwrap_err().name, "schemeId");
    }

    #[test]
    fn referenced_fields_deduplicated() {
        let spec = ExpectationSpec {
            non_null: vec!["PatientId".into(), "VisitId".into()],
            must_be_null: vec!["DischargeDate".into()],
            unique: vec!["PatientId".into(), "VisitId".into()],
            ..Default::default()
        };
        assert_eq!(
            spec.referenced_fields(),
            vec!["PatientId", "VisitId", "DischargeDate"]
        );
    }
}
