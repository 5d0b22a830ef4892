//! Transport abstraction.
//!
//! A connector performs exactly one network exchange per call. It is a
//! `tower::Service` whose future resolves once, so a completion can never be
//! delivered twice or skipped:
//!
//! - [`http`]: JSON over HTTP POST; interpretation of the body is left to the operation
//! - [`soap`]: SOAP over HTTP POST; decodes the envelope before completing
//! - [`canned`]: fixed responses for tests and offline runs
//! - [`middleware`]: timeout and tracing layers, plus the default pipeline

use std::sync::Arc;

use datasource_core::{Credentials, DataSourceKey, TransportFault};
use tower::util::BoxCloneService;

pub mod canned;
pub mod http;
pub mod middleware;
pub mod progress;
pub mod soap;

pub use canned::CannedConnector;
pub use http::HttpConnector;
pub use middleware::{
    build_connector, build_soap_connector, layer_connector, InvocationTraceLayer, TimeoutLayer,
};
pub use progress::ProgressReporter;
pub use soap::{SoapConnector, SoapResponse};

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// Everything one exchange needs. Built fresh for every invocation.
#[derive(Debug, Clone)]
pub struct ConnectorRequest {
    pub key: DataSourceKey,
    /// Fully resolved target URL.
    pub url: String,
    pub credentials: Arc<Credentials>,
    pub body: String,
    pub progress: ProgressReporter,
}

/// Status and body of a completed exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Type-erased JSON connector. Cloned once per invocation.
pub type BoxConnector = BoxCloneService<ConnectorRequest, RawResponse, TransportFault>;

/// Type-erased SOAP connector.
pub type BoxSoapConnector = BoxCloneService<ConnectorRequest, SoapResponse, TransportFault>;
