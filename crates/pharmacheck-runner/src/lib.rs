//! pharmacheck-runner: sends catalog requests and evaluates the responses

pub mod auth;
pub mod suite;
pub mod transport;

pub use auth::{AuthError, AuthProvider, EnvAuth, HeaderAuth, NoAuth};
pub use suite::{RunnerError, SuiteRunner};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};
