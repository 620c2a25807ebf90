//! HTTP transport seam
//!
//! The suite runner only sees [`Transport`]; [`HttpTransport`] is the
//! reqwest-backed implementation used by the CLI.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// One outgoing GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Full URL, query already encoded
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

/// Raw response as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
    /// Seconds from send to full body
    pub elapsed: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Client(String),
    #[error("invalid header {0}")]
    InvalidHeader(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// Sends requests and returns raw responses. Non-2xx statuses are responses,
/// not errors.
pub trait Transport {
    /// # Errors
    ///
    /// Returns error when no response could be obtained.
    fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Blocking reqwest transport
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut req = self.client.get(&request.url);
        for (k, v) in &request.headers {
            if reqwest::header::HeaderValue::from_str(v).is_err() {
                return Err(TransportError::InvalidHeader(k.clone()));
            }
            req = req.header(k, v);
        }

        let start = Instant::now();
        let resp = req
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status_code = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| TransportError::Request(format!("reading body: {e}")))?;

        Ok(ApiResponse {
            status_code,
            body,
            elapsed: start.elapsed().as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_timeout() {
        assert!(HttpTransport::new(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn invalid_header_value_is_rejected_before_send() {
        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();
        let request = ApiRequest {
            url: "http://127.0.0.1:9/never".into(),
            headers: BTreeMap::from([("Authorization".to_string(), "bad\nvalue".to_string())]),
        };
        let err = transport.get(&request).unwrap_err();
        assert!(matches!(err, TransportError::InvalidHeader(h) if h == "Authorization"));
    }
}
