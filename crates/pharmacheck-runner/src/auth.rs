//! Authorization header providers

use pharmacheck_core::Config;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
    #[error("environment variable {0} is empty")]
    EmptyEnv(String),
}

/// Supplies the `Authorization` header value, if any.
pub trait AuthProvider {
    /// # Errors
    ///
    /// Returns error when the configured credential is unavailable.
    fn authorization(&self) -> Result<Option<String>, AuthError>;
}

/// No Authorization header
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn authorization(&self) -> Result<Option<String>, AuthError> {
        Ok(None)
    }
}

/// Fixed header value (from config `headers.Authorization`)
pub struct HeaderAuth(pub String);

impl AuthProvider for HeaderAuth {
    fn authorization(&self) -> Result<Option<String>, AuthError> {
        Ok(Some(self.0.clone()))
    }
}

/// Header value read from an environment variable at run time
pub struct EnvAuth {
    var: String,
    lookup: fn(&str) -> Option<String>,
}

impl EnvAuth {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            lookup: |name| std::env::var(name).ok(),
        }
    }

    /// Replace the environment lookup (tests)
    #[must_use]
    pub fn with_lookup(mut self, lookup: fn(&str) -> Option<String>) -> Self {
        self.lookup = lookup;
        self
    }
}

impl AuthProvider for EnvAuth {
    fn authorization(&self) -> Result<Option<String>, AuthError> {
        match (self.lookup)(&self.var) {
            Some(value) if value.trim().is_empty() => Err(AuthError::EmptyEnv(self.var.clone())),
            Some(value) => Ok(Some(value)),
            None => Err(AuthError::MissingEnv(self.var.clone())),
        }
    }
}

/// Pick a provider: `auth_env` wins over a configured Authorization header.
#[must_use]
pub fn from_config(config: &Config) -> Box<dyn AuthProvider> {
    if let Some(var) = &config.auth_env {
        return Box::new(EnvAuth::new(var.clone()));
    }
    config
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
        .map_or_else(
            || Box::new(NoAuth) as Box<dyn AuthProvider>,
            |(_, v)| Box::new(HeaderAuth(v.clone())),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_auth_reads_variable() {
        let auth = EnvAuth::new("TOKEN").with_lookup(|_| Some("Basic abc".into()));
        assert_eq!(auth.authorization().unwrap().as_deref(), Some("Basic abc"));
    }

    #[test]
    fn env_auth_missing_is_error() {
        let auth = EnvAuth::new("TOKEN").with_lookup(|_| None);
        assert_eq!(
            auth.authorization().unwrap_err().to_string(),
            "environment variable TOKEN is not set"
        );
    }

    #[test]
    fn env_auth_blank_is_error() {
        let auth = EnvAuth::new("TOKEN").with_lookup(|_| Some("  ".into()));
        assert!(matches!(auth.authorization(), Err(AuthError::EmptyEnv(_))));
    }

    #[test]
    fn from_config_prefers_env() {
        let mut config = Config {
            auth_env: Some("PHARMACHECK_TEST_UNSET_VAR".into()),
            ..Config::default()
        };
        config
            .headers
            .insert("authorization".into(), "Basic from-header".into());
        assert!(from_config(&config).authorization().is_err());

        config.auth_env = None;
        assert_eq!(
            from_config(&config).authorization().unwrap().as_deref(),
            Some("Basic from-header")
        );
    }

    #[test]
    fn from_config_without_credentials() {
        assert!(from_config(&Config::default()).authorization().unwrap().is_none());
    }
}
