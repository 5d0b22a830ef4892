//! Pipeline composition: wraps a connector in the middleware layers.

use datasource_core::TransportFault;
use tower::util::BoxCloneService;
use tower::{Service, ServiceBuilder};

use super::timeout::TimeoutLayer;
use super::trace::InvocationTraceLayer;
use crate::config::ClientConfig;
use crate::connector::{
    BoxConnector, BoxSoapConnector, ConnectorRequest, HttpConnector, SoapConnector,
};

/// Wrap any connector with the standard layers and erase its type.
///
/// Layer order (outermost to innermost):
/// 1. `InvocationTraceLayer` -- span, duration and outcome, timeouts included
/// 2. `TimeoutLayer` -- `config.request_timeout`, if set
#[must_use]
pub fn layer_connector<S>(
    connector: S,
    config: &ClientConfig,
) -> BoxCloneService<ConnectorRequest, S::Response, TransportFault>
where
    S: Service<ConnectorRequest, Error = TransportFault> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
{
    BoxCloneService::new(
        ServiceBuilder::new()
            .layer(InvocationTraceLayer)
            .layer(TimeoutLayer::new(config.request_timeout))
            .service(connector),
    )
}

/// The default JSON connector stack for `config`.
///
/// # Errors
///
/// Returns `TransportFault::Connect` if the HTTP client cannot be built.
pub fn build_connector(config: &ClientConfig) -> Result<BoxConnector, TransportFault> {
    Ok(layer_connector(HttpConnector::new(config)?, config))
}

/// The default SOAP connector stack for `config`.
///
/// # Errors
///
/// Returns `TransportFault` if the HTTP client cannot be built or the user
/// agent is invalid.
pub fn build_soap_connector(config: &ClientConfig) -> Result<BoxSoapConnector, TransportFault> {
    Ok(layer_connector(SoapConnector::new(config)?, config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use datasource_core::{Credentials, DataSourceKey, Progress};
    use tower::ServiceExt;

    use super::*;
    use crate::connector::{CannedConnector, ProgressReporter, RawResponse};

    fn make_request() -> (ConnectorRequest, tokio::sync::mpsc::UnboundedReceiver<Progress>) {
        let (progress, rx) = ProgressReporter::channel();
        let request = ConnectorRequest {
            key: DataSourceKey(6455),
            url: "http://localhost/".to_string(),
            credentials: Arc::new(Credentials::new("u", "p")),
            body: "{}".to_string(),
            progress,
        };
        (request, rx)
    }

    #[tokio::test]
    async fn pipeline_routes_through_all_layers() {
        let svc = layer_connector(CannedConnector::respond(200, "ok"), &ClientConfig::default());
        let (request, _rx) = make_request();
        assert_eq!(svc.oneshot(request).await.unwrap(), RawResponse::new(200, "ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn pipeline_applies_configured_timeout() {
        let config = ClientConfig {
            request_timeout: Some(Duration::from_millis(20)),
            ..ClientConfig::default()
        };
        let slow = CannedConnector::respond(200, "ok").with_delay(Duration::from_secs(1));
        let (request, _rx) = make_request();
        let err = layer_connector(slow, &config).oneshot(request).await.unwrap_err();
        assert_eq!(err, TransportFault::Timeout { after_ms: 20 });
    }

    #[test]
    fn default_stacks_build() {
        let config = ClientConfig::new("acme");
        assert!(build_connector(&config).is_ok());
        assert!(build_soap_connector(&config).is_ok());
    }
}
