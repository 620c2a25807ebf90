//! Project configuration for API checks

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, CatalogError};
use crate::template::Params;
use crate::verdict::{CheckKind, SuitePolicy};

pub const DEFAULT_BASE_URL: &str = "https://healthapp.yaksha.com/api";
pub const DEFAULT_DUMP_DIR: &str = ".pharmacheck/dumps";

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the API under test
    pub base_url: String,

    /// HTTP headers sent with every request
    pub headers: BTreeMap<String, String>,

    /// Environment variable holding the Authorization header value
    pub auth_env: Option<String>,

    /// Placeholder values applied to every endpoint
    pub params: Params,

    /// Placeholder values per endpoint key (override `params`)
    pub endpoint_params: BTreeMap<String, Params>,

    /// Catalog file replacing the built-in endpoint table
    pub catalog: Option<PathBuf>,

    /// Endpoint keys to run (empty = all)
    pub only: Vec<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Check kinds whose violations are ignored
    pub ignore_checks: Vec<CheckKind>,

    /// Dump every request/response pair to JSONL files
    pub dump: bool,

    /// Directory for dump files (default: ".pharmacheck/dumps")
    pub dump_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: BTreeMap::new(),
            auth_env: None,
            params: Params::new(),
            endpoint_params: BTreeMap::new(),
            catalog: None,
            only: Vec::new(),
            timeout_secs: 30,
            ignore_checks: Vec::new(),
            dump: false,
            dump_dir: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.pharmacheck.toml)
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_default_in(Path::new("."))
    }

    /// Load the first default-named config file found in `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be read or parsed
    pub fn load_default_in(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [".pharmacheck.toml", ".pharmacheck.json", "pharmacheck.toml"];

        for name in candidates {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// Parameter layers for one endpoint, lowest precedence first.
    ///
    /// The endpoint's own defaults sit below these.
    #[must_use]
    pub fn param_layers(&self, key: &str) -> Vec<&Params> {
        let mut layers = vec![&self.params];
        if let Some(specific) = self.endpoint_params.get(key) {
            layers.push(specific);
        }
        layers
    }

    /// The configured catalog file, or the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns catalog load or validation errors.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::builtin()),
        }
    }

    #[must_use]
    pub fn suite_policy(&self) -> SuitePolicy {
        SuitePolicy {
            ignore_checks: self.ignore_checks.clone(),
        }
    }

    #[must_use]
    pub fn dump_dir(&self) -> PathBuf {
        self.dump_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DUMP_DIR))
    }

    /// Create example config file
    #[must_use]
    pub fn example() -> &'static str {
        r#"# pharmacheck configuration

# API under test
base_url = "https://healthapp.yaksha.com/api"

# Authorization header value is read from this environment variable
auth_env = "PHARMACHECK_TOKEN"

# Request timeout in seconds
timeout_secs = 30

# Run only these endpoints (default: all)
# only = ["getAllStocks", "getMainStore"]

# Replace the built-in endpoint catalog (TOML, JSON, or YAML)
# catalog = "catalog.toml"

# Ignore violations of these kinds
# ignore_checks = ["uniqueness"]

# Dump all request/response pairs to JSONL files (default: false)
# dump = true
# dump_dir = ".pharmacheck/dumps"

# Keys after a [table] header belong to that table; top-level keys stay above.

# Extra HTTP headers
# [headers]
# X-Correlation-Id = "pharmacheck"

# Placeholder overrides for every endpoint
[params]
fromDate = "2020-01-01"
toDate = "2024-11-19"

# Placeholder overrides for one endpoint
# [endpoint_params.getBillingSummaryByPatientId]
# patientId = "114"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.dump_dir(), PathBuf::from(DEFAULT_DUMP_DIR));
    }

    #[test]
    fn parse_toml() {
        let toml = r#"
base_url = "http://localhost:3000/api"
auth_env = "TOKEN"
only = ["getAllStocks"]
ignore_checks = ["uniqueness"]

[headers]
X-Trace = "1"

[params]
toDate = "2025-01-01"

[endpoint_params.getBillingSummaryByPatientId]
patientId = "188"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.base_url, "http://localhost:3000/api");
        assert_eq!(config.auth_env.as_deref(), Some("TOKEN"));
        assert_eq!(config.headers.get("X-Trace"), Some(&"1".to_string()));
        assert_eq!(config.only, vec!["getAllStocks"]);
        assert_eq!(config.suite_policy().ignore_checks, vec![CheckKind::Uniqueness]);
        // unspecified fields keep defaults
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn param_layers_order() {
        let toml = r#"
[params]
patientId = "120"

[endpoint_params.getBillingSummaryByPatientId]
patientId = "188"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let layers = config.param_layers("getBillingSummaryByPatientId");
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1]["patientId"], "188");
        assert_eq!(config.param_layers("getAllStocks").len(), 1);
    }

    #[test]
    fn load_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"base_url": "http://127.0.0.1:9000", "dump": true}}"#).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert!(config.dump);
    }

    #[test]
    fn load_default_in_prefers_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pharmacheck.toml"), "timeout_secs = 5").unwrap();
        std::fs::write(dir.path().join(".pharmacheck.toml"), "timeout_secs = 7").unwrap();
        assert_eq!(Config::load_default_in(dir.path()).unwrap().timeout_secs, 7);
    }

    #[test]
    fn load_default_in_empty_dir_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_default_in(dir.path()).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn load_bad_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn example_parses() {
        let config: Config = toml::from_str(Config::example()).unwrap();
        assert_eq!(config.auth_env.as_deref(), Some("PHARMACHECK_TOKEN"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.params["fromDate"], "2020-01-01");
        assert_eq!(config.params.len(), 2);
    }

    #[test]
    fn example_parses_with_every_option_uncommented() {
        let uncommented: String = Config::example()
            .lines()
            .map(|line| match line.strip_prefix("# ") {
                Some(rest) if rest.contains(" = ") || rest.starts_with('[') => rest,
                _ => line,
            })
            .collect::<Vec<_>>()
            .join("\n");
        let config: Config = toml::from_str(&uncommented).unwrap();

        assert_eq!(config.only, vec!["getAllStocks", "getMainStore"]);
        assert_eq!(config.catalog, Some(PathBuf::from("catalog.toml")));
        assert_eq!(config.ignore_checks, vec![CheckKind::Uniqueness]);
        assert!(config.dump);
        assert_eq!(config.dump_dir(), PathBuf::from(DEFAULT_DUMP_DIR));
        assert_eq!(config.headers["X-Correlation-Id"], "pharmacheck");
        assert_eq!(config.params.len(), 2);
        assert_eq!(
            config.endpoint_params["getBillingSummaryByPatientId"]["patientId"],
            "114"
        );
    }

    #[test]
    fn builtin_catalog_without_file() {
        assert_eq!(Config::default().catalog().unwrap().len(), 18);
    }
}
