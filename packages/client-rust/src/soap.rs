//! Legacy web-service calls.
//!
//! A [`WebServiceCall`] sends any data source key with string-rendered
//! parameters through the SOAP endpoint. The connector decodes the envelope,
//! so results arrive as generic rows with the service status as outputs.

use std::collections::BTreeMap;
use std::sync::Arc;

use datasource_core::wire::soap::{encode_envelope, SoapStatus};
use datasource_core::{Credentials, DataSourceKey, GenericRow, Value};
use tower::ServiceExt;
use tracing::{debug, info_span, Instrument};

use crate::config::ClientConfig;
use crate::connector::{BoxSoapConnector, ConnectorRequest, ProgressReporter};
use crate::datasource::{ExecuteError, Invocation};

/// One web-service invocation of a data source key.
pub struct WebServiceCall {
    key: DataSourceKey,
    params: BTreeMap<String, Value>,
    credentials: Arc<Credentials>,
    config: Arc<ClientConfig>,
    connector: BoxSoapConnector,
    executed: bool,
}

impl WebServiceCall {
    #[must_use]
    pub fn new(
        key: impl Into<DataSourceKey>,
        credentials: Arc<Credentials>,
        config: Arc<ClientConfig>,
        connector: BoxSoapConnector,
    ) -> Self {
        Self {
            key: key.into(),
            params: BTreeMap::new(),
            credentials,
            config,
            connector,
            executed: false,
        }
    }

    #[must_use]
    pub fn key(&self) -> DataSourceKey {
        self.key
    }

    /// Set a parameter, replacing any earlier value. The `@` prefix the
    /// service expects is added on the wire.
    pub fn add_input_parameter(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// The envelope `execute` would send.
    #[must_use]
    pub fn envelope(&self) -> String {
        encode_envelope(self.key, &self.params)
    }

    /// # Errors
    ///
    /// Returns `ExecuteError` if this call already ran or no tokio runtime is
    /// current.
    pub fn execute(&mut self) -> Result<Invocation<SoapStatus, GenericRow>, ExecuteError> {
        if self.executed {
            return Err(ExecuteError::AlreadyExecuted(self.key));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ExecuteError::NoRuntime)?;

        let (progress, receiver) = ProgressReporter::channel();
        let request = ConnectorRequest {
            key: self.key,
            url: self.config.soap_endpoint().to_string(),
            credentials: Arc::clone(&self.credentials),
            body: self.envelope(),
            progress,
        };
        let connector = self.connector.clone();
        self.executed = true;

        debug!(
            key = %self.key,
            url = %request.url,
            params = self.params.len(),
            "executing web service call"
        );
        let span = info_span!("web_service", key = self.key.get());
        let handle = runtime.spawn(
            async move {
                match connector.oneshot(request).await {
                    Ok(response) => response.into_data_source_result(),
                    Err(fault) => fault.into(),
                }
            }
            .instrument(span),
        );
        Ok(Invocation::new(self.key, receiver, handle))
    }
}

#[cfg(test)]
mod tests {
    use datasource_core::{Failure, Progress, TransportFault};

    use super::*;
    use crate::connector::{layer_connector, SoapConnector};

    /// Config aimed at a loopback port nothing listens on.
    fn unreachable_config() -> Arc<ClientConfig> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Arc::new(ClientConfig {
            soap_production_url: format!("http://127.0.0.1:{port}/DataSource/Service.asmx"),
            ..ClientConfig::default()
        })
    }

    fn call() -> WebServiceCall {
        let config = unreachable_config();
        let connector = layer_connector(SoapConnector::new(&config).unwrap(), &config);
        let credentials = Arc::new(Credentials::new("u", "p"));
        WebServiceCall::new(DataSourceKey(6455), credentials, config, connector)
    }

    #[test]
    fn parameters_are_prefixed_in_envelope() {
        let mut soap = call();
        soap.add_input_parameter("Serial_No", "S123456")
            .add_input_parameter("Quantity", Value::Int(3));
        let envelope = soap.envelope();
        assert!(envelope.contains("<DataSourceKey>6455</DataSourceKey>"));
        assert!(envelope.contains("<Value>S123456</Value><Name>@Serial_No</Name>"));
        assert!(envelope.contains("<Value>3</Value><Name>@Quantity</Name>"));
    }

    #[test]
    fn replacing_a_parameter_keeps_one_entry() {
        let mut soap = call();
        soap.add_input_parameter("Location", "A");
        soap.add_input_parameter("Location", "B");
        assert_eq!(soap.params().len(), 1);
        assert_eq!(soap.params()["Location"], Value::from("B"));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_failure() {
        let mut soap = call();
        let mut invocation = soap.execute().unwrap();
        let mut progress = invocation.take_progress().unwrap();
        let result = invocation.result().await;
        assert!(matches!(result.failure(), Some(Failure::Transport(TransportFault::Connect(_)))));
        assert_eq!(progress.recv().await, Some(Progress::Error));
        assert!(matches!(soap.execute(), Err(ExecuteError::AlreadyExecuted(_))));
    }
}
