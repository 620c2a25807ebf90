//! Sequential suite execution
//!
//! Endpoints run one after another in catalog order. Each case is
//! resolved, sent, parsed, adapted and evaluated; a failure in one case
//! never aborts the rest unless stop-on-failure is set.

use std::collections::BTreeMap;
use std::time::Duration;

use pharmacheck_core::{
    CaseOutcome, CaseReport, Catalog, CatalogError, Config, EndpointDef, SuitePolicy, SuiteReport,
    adapt, evaluate,
};

use crate::auth::{self, AuthError, AuthProvider};
use crate::transport::{ApiRequest, HttpTransport, Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("HTTP error: {0}")]
    Http(#[from] TransportError),
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Runs a catalog against one API.
pub struct SuiteRunner {
    config: Config,
    catalog: Catalog,
    transport: Box<dyn Transport>,
    auth: Box<dyn AuthProvider>,
    policy: SuitePolicy,
    stop_on_failure: bool,
    progress: bool,
}

impl SuiteRunner {
    #[must_use]
    pub fn new(
        config: &Config,
        catalog: Catalog,
        transport: Box<dyn Transport>,
        auth: Box<dyn AuthProvider>,
    ) -> Self {
        Self {
            policy: config.suite_policy(),
            config: config.clone(),
            catalog,
            transport,
            auth,
            stop_on_failure: false,
            progress: false,
        }
    }

    /// Runner with the configured catalog, a reqwest transport, and the
    /// configured credentials.
    ///
    /// # Errors
    ///
    /// Returns error if the catalog cannot be loaded or the HTTP client fails to build.
    pub fn from_config(config: &Config) -> Result<Self, RunnerError> {
        let catalog = config.catalog()?;
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(
            config,
            catalog,
            Box::new(transport),
            auth::from_config(config),
        ))
    }

    #[must_use]
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SuitePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Print one progress line per case to stderr
    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run the selected endpoints (`only` empty: the configured selection,
    /// or the whole catalog).
    ///
    /// # Errors
    ///
    /// Returns error for unknown endpoint keys or unavailable credentials.
    /// Per-case problems are recorded as error outcomes instead.
    pub fn run(&self, only: &[String]) -> Result<SuiteReport, RunnerError> {
        let only = if only.is_empty() { &self.config.only } else { only };
        let selected = self.catalog.select(only)?;
        let authorization = self.auth.authorization()?;

        if self.progress {
            eprintln!(
                "Checking {} endpoints against {}...",
                selected.len(),
                self.config.base_url
            );
        }

        let mut report = SuiteReport {
            base_url: self.config.base_url.clone(),
            cases: Vec::with_capacity(selected.len()),
            stopped_early: false,
        };

        for (i, endpoint) in selected.iter().enumerate() {
            let case = self.run_case(endpoint, authorization.as_deref());
            if self.progress {
                eprintln!("  [{}/{}] {} {}", i + 1, selected.len(), case.label(), case.endpoint);
            }
            let stop = self.stop_on_failure && !case.passed();
            report.cases.push(case);
            if stop && i + 1 < selected.len() {
                report.stopped_early = true;
                break;
            }
        }

        if report.stopped_early && self.progress {
            eprintln!("Stopped early: failure detected (--stop-on-failure)");
        }

        Ok(report)
    }

    /// Execute one endpoint. Never fails: problems become error outcomes.
    #[must_use]
    pub fn run_case(&self, endpoint: &EndpointDef, authorization: Option<&str>) -> CaseReport {
        let headers = self.request_headers(authorization);

        let resolved = match endpoint.resolve(self.config.param_layers(&endpoint.key)) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(endpoint = %endpoint.key, error = %e, "cannot resolve request");
                return CaseReport {
                    endpoint: endpoint.key.clone(),
                    url: endpoint.path.clone(),
                    request_headers: headers,
                    elapsed: 0.0,
                    outcome: CaseOutcome::Error {
                        status_code: None,
                        message: e.to_string(),
                    },
                };
            }
        };

        let request = ApiRequest {
            url: resolved.url(&self.config.base_url),
            headers,
        };
        tracing::debug!(endpoint = %endpoint.key, url = %request.url, "sending request");

        let (elapsed, outcome) = match self.transport.get(&request) {
            Err(e) => {
                tracing::warn!(endpoint = %endpoint.key, error = %e, "request failed");
                (
                    0.0,
                    CaseOutcome::Error {
                        status_code: None,
                        message: e.to_string(),
                    },
                )
            }
            Ok(response) => {
                let outcome = match serde_json::from_str::<serde_json::Value>(&response.body) {
                    Err(e) => CaseOutcome::Error {
                        status_code: Some(response.status_code),
                        message: format!("response body is not JSON: {e}"),
                    },
                    Ok(body) => {
                        tracing::debug!(endpoint = %endpoint.key, body = %body, "response body");
                        let normalized = adapt(body, response.status_code, &endpoint.extract);
                        let verdict = self.policy.apply(&evaluate(&resolved.expect, &normalized));
                        CaseOutcome::Checked {
                            status_code: response.status_code,
                            verdict,
                            body: normalized.raw_body().clone(),
                        }
                    }
                };
                (response.elapsed, outcome)
            }
        };

        let case = CaseReport {
            endpoint: endpoint.key.clone(),
            url: request.url,
            request_headers: request.headers,
            elapsed,
            outcome,
        };
        tracing::info!(
            endpoint = %case.endpoint,
            status = ?case.status_code(),
            result = case.label(),
            violations = case.verdict().map_or(0, |v| v.violations.len()),
            elapsed = case.elapsed,
            "case finished"
        );
        case
    }

    fn request_headers(&self, authorization: Option<&str>) -> BTreeMap<String, String> {
        let mut headers: BTreeMap<String, String> = self
            .config
            .headers
            .iter()
            .filter(|(k, _)| !k.eq_ignore_ascii_case("authorization"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(value) = authorization {
            headers.insert("Authorization".to_string(), value.to_string());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{HeaderAuth, NoAuth};
    use crate::transport::ApiResponse;
    use pharmacheck_core::CheckKind;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Canned responses keyed by URL path (query ignored).
    #[derive(Default, Clone)]
    struct FakeTransport {
        responses: HashMap<String, Result<(u16, String), String>>,
        sent: Rc<RefCell<Vec<ApiRequest>>>,
    }

    impl FakeTransport {
        fn respond(mut self, path: &str, status: u16, body: serde_json::Value) -> Self {
            self.responses
                .insert(path.to_string(), Ok((status, body.to_string())));
            self
        }

        fn respond_raw(mut self, path: &str, status: u16, body: &str) -> Self {
            self.responses
                .insert(path.to_string(), Ok((status, body.to_string())));
            self
        }

        fn fail(mut self, path: &str, message: &str) -> Self {
            self.responses
                .insert(path.to_string(), Err(message.to_string()));
            self
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            self.sent.borrow_mut().push(request.clone());
            let path = request
                .url
                .trim_start_matches(BASE)
                .split('?')
                .next()
                .unwrap_or_default()
                .to_string();
            match self.responses.get(&path) {
                Some(Ok((status_code, body))) => Ok(ApiResponse {
                    status_code: *status_code,
                    body: body.clone(),
                    elapsed: 0.01,
                }),
                Some(Err(message)) => Err(TransportError::Request(message.clone())),
                None => Ok(ApiResponse {
                    status_code: 404,
                    body: String::from("Not Found"),
                    elapsed: 0.01,
                }),
            }
        }
    }

    const BASE: &str = "http://api.test/api";

    fn config(only: &[&str]) -> Config {
        Config {
            base_url: BASE.into(),
            only: only.iter().map(|s| (*s).to_string()).collect(),
            ..Config::default()
        }
    }

    fn runner(config: &Config, transport: FakeTransport) -> SuiteRunner {
        SuiteRunner::new(
            config,
            Catalog::builtin(),
            Box::new(transport),
            Box::new(HeaderAuth("Basic token".into())),
        )
    }

    fn stocks_ok() -> serde_json::Value {
        json!({"Status": "OK", "Results": [
            {"ItemId": 1, "ItemName": "Paracetamol", "GenericName": "Acetaminophen",
             "SalePrice": 2.5, "CostPrice": 1.5}
        ]})
    }

    #[test]
    fn passing_case() {
        let transport = FakeTransport::default().respond("/PharmacyStock/AllStockDetails", 200, stocks_ok());
        let sent = Rc::clone(&transport.sent);
        let report = runner(&config(&["getAllStocks"]), transport).run(&[]).unwrap();

        assert_eq!(report.cases.len(), 1);
        assert!(report.cases[0].passed());
        let request = &sent.borrow()[0];
        assert_eq!(request.url, format!("{BASE}/PharmacyStock/AllStockDetails"));
        assert_eq!(request.headers["Authorization"], "Basic token");
        assert_eq!(request.headers["Content-Type"], "application/json");
    }

    #[test]
    fn query_uses_layered_params() {
        let mut cfg = config(&["getBillingSummaryByPatientId"]);
        cfg.endpoint_params.insert(
            "getBillingSummaryByPatientId".into(),
            [("patientId".to_string(), "115".to_string())].into_iter().collect(),
        );
        let transport = FakeTransport::default().respond(
            "/PharmacySales/PatientBillingSummary",
            200,
            json!({"Status": "OK", "Results": {"PatientId": 115, "TotalDue": 10}}),
        );
        let sent = Rc::clone(&transport.sent);
        let report = runner(&cfg, transport).run(&[]).unwrap();

        assert!(sent.borrow()[0].url.ends_with("?patientId=115"));
        // expectation follows the same parameter
        assert!(report.cases[0].passed(), "{:?}", report.cases[0]);
    }

    #[test]
    fn transport_error_is_recorded_and_run_continues() {
        let transport = FakeTransport::default()
            .fail("/PharmacyStock/AllStockDetails", "connection refused")
            .respond(
                "/PharmacySettings/MainStore",
                200,
                json!({"Status": "OK", "Results": {"StoreId": 1, "Category": "main", "IsActive": true}}),
            );
        let report = runner(&config(&[]), transport)
            .run(&["getAllStocks".into(), "getMainStore".into()])
            .unwrap();

        assert_eq!(report.cases.len(), 2);
        assert!(report.cases[0].is_error());
        assert!(report.cases[1].passed());
        let counts = report.counts();
        assert_eq!((counts.errors, counts.passed), (1, 1));
    }

    #[test]
    fn non_json_body_is_error_with_status() {
        let transport = FakeTransport::default().respond_raw(
            "/PharmacyStock/AllStockDetails",
            502,
            "<html>Bad Gateway</html>",
        );
        let report = runner(&config(&["getAllStocks"]), transport).run(&[]).unwrap();
        let case = &report.cases[0];
        assert!(case.is_error());
        assert_eq!(case.status_code(), Some(502));
    }

    #[test]
    fn stop_on_failure_skips_remaining() {
        let transport = FakeTransport::default().respond(
            "/PharmacyStock/AllStockDetails",
            200,
            json!({"Status": "OK", "Results": []}),
        );
        let report = runner(&config(&[]), transport)
            .with_stop_on_failure(true)
            .run(&["getAllStocks".into(), "getMainStore".into()])
            .unwrap();

        assert_eq!(report.cases.len(), 1);
        assert!(report.cases[0].failed());
        assert!(report.stopped_early);
    }

    #[test]
    fn policy_drops_ignored_checks() {
        let duplicate = json!({"Status": "OK", "Results": [
            {"EmployeeId": 1, "EmployeeName": "A"},
            {"EmployeeId": 1, "EmployeeName": "A"}
        ]});
        let transport = FakeTransport::default().respond("/Billing/GetProviderList", 200, duplicate);
        let report = runner(&config(&["getProviderList"]), transport)
            .with_policy(SuitePolicy {
                ignore_checks: vec![CheckKind::Uniqueness],
            })
            .run(&[])
            .unwrap();
        assert!(report.cases[0].passed());
    }

    #[test]
    fn unknown_only_key_is_run_error() {
        let err = runner(&config(&[]), FakeTransport::default())
            .run(&["nope".into()])
            .unwrap_err();
        assert!(matches!(err, RunnerError::Catalog(_)));
    }

    #[test]
    fn missing_credentials_abort_before_sending() {
        let transport = FakeTransport::default();
        let sent = Rc::clone(&transport.sent);
        let runner = SuiteRunner::new(
            &config(&["getAllStocks"]),
            Catalog::builtin(),
            Box::new(transport),
            Box::new(crate::auth::EnvAuth::new("UNSET").with_lookup(|_| None)),
        );
        assert!(matches!(runner.run(&[]), Err(RunnerError::Auth(_))));
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn no_auth_sends_no_authorization_header() {
        let transport = FakeTransport::default().respond("/PharmacyStock/AllStockDetails", 200, stocks_ok());
        let sent = Rc::clone(&transport.sent);
        let runner = SuiteRunner::new(
            &config(&["getAllStocks"]),
            Catalog::builtin(),
            Box::new(transport),
            Box::new(NoAuth),
        );
        runner.run(&[]).unwrap();
        assert!(!sent.borrow()[0].headers.contains_key("Authorization"));
    }

    #[test]
    fn configured_content_type_is_not_duplicated() {
        let mut cfg = config(&["getAllStocks"]);
        cfg.headers
            .insert("content-type".into(), "application/json; charset=utf-8".into());
        let transport = FakeTransport::default().respond("/PharmacyStock/AllStockDetails", 200, stocks_ok());
        let sent = Rc::clone(&transport.sent);
        runner(&cfg, transport).run(&[]).unwrap();

        let headers = &sent.borrow()[0].headers;
        let content_types: Vec<_> = headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(content_types[0].1, "application/json; charset=utf-8");
    }

    #[test]
    fn whole_catalog_runs_in_order() {
        let report = runner(&config(&[]), FakeTransport::default()).run(&[]).unwrap();
        let keys: Vec<_> = report.cases.iter().map(|c| c.endpoint.as_str()).collect();
        let builtin = Catalog::builtin();
        let expected: Vec<_> = builtin.keys().collect();
        assert_eq!(keys, expected);
        // every fake 404 body is non-JSON
        assert!(report.cases.iter().all(CaseReport::is_error));
    }
}
