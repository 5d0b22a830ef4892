//! The operation pipeline.
//!
//! A [`DataSource`] pairs a [`Shape`] (key, input record, decoders) with
//! credentials, configuration and a connector. Executing it spawns one worker
//! task that performs the exchange and parses the response on that task; the
//! caller gets an [`Invocation`] to observe milestones and await the result.

use std::sync::Arc;

use datasource_core::wire::json::{self, OutputDecoder, RowDecoder};
use datasource_core::{
    Credentials, DataSourceKey, DataSourceResult, Failure, Progress, SerializationError,
    TransportFault,
};
use serde::Serialize;
use tower::ServiceExt;
use tracing::{debug, info_span, Instrument};

use crate::config::ClientConfig;
use crate::connector::{BoxConnector, ConnectorRequest, ProgressReporter, RawResponse};

pub mod dynamic;
pub mod invocation;

pub use dynamic::DynamicShape;
pub use invocation::{DataSourceCallback, Invocation};

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Static description of one server-side operation.
///
/// Decoders are plain function pointers; a shape that declares neither
/// returns no outputs and no table.
pub trait Shape {
    /// Input record, serialized field by field in declaration order.
    type Inputs: Serialize + Default;
    type Output: Send + 'static;
    type Row: Send + 'static;

    fn key(&self) -> DataSourceKey;

    fn output_decoder() -> Option<OutputDecoder<Self::Output>> {
        None
    }

    fn row_decoder() -> Option<RowDecoder<Self::Row>> {
        None
    }
}

/// Why an invocation could not be started.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// Each `DataSource` runs at most once; build a new one to call again.
    #[error("data source {0} has already been executed")]
    AlreadyExecuted(DataSourceKey),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error("no tokio runtime available to run the invocation")]
    NoRuntime,
}

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

/// One callable instance of an operation with its own inputs.
pub struct DataSource<S: Shape> {
    shape: S,
    inputs: S::Inputs,
    credentials: Arc<Credentials>,
    config: Arc<ClientConfig>,
    connector: BoxConnector,
    executed: bool,
}

impl<S: Shape> DataSource<S> {
    /// Inputs start at their defaults.
    #[must_use]
    pub fn new(
        shape: S,
        credentials: Arc<Credentials>,
        config: Arc<ClientConfig>,
        connector: BoxConnector,
    ) -> Self {
        Self {
            shape,
            inputs: S::Inputs::default(),
            credentials,
            config,
            connector,
            executed: false,
        }
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: S::Inputs) -> Self {
        self.inputs = inputs;
        self
    }

    #[must_use]
    pub fn key(&self) -> DataSourceKey {
        self.shape.key()
    }

    #[must_use]
    pub fn inputs(&self) -> &S::Inputs {
        &self.inputs
    }

    /// # Errors
    ///
    /// Returns `ExecuteError::AlreadyExecuted` once `execute` has been called,
    /// since the request for this instance has already been sent.
    pub fn inputs_mut(&mut self) -> Result<&mut S::Inputs, ExecuteError> {
        if self.executed {
            return Err(ExecuteError::AlreadyExecuted(self.key()));
        }
        Ok(&mut self.inputs)
    }

    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// The POST body `execute` would send. Pure; identical inputs give
    /// identical text.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the inputs cannot be encoded.
    pub fn json_request_body(&self) -> Result<String, SerializationError> {
        json::encode_request(&self.inputs, self.config.wire_format)
    }

    /// Start the invocation on a background task.
    ///
    /// Nothing is sent if the inputs fail to serialize. The returned handle
    /// yields exactly one result.
    ///
    /// # Errors
    ///
    /// Returns `ExecuteError` if this instance already ran, the inputs cannot
    /// be serialized, or no tokio runtime is current.
    pub fn execute(&mut self) -> Result<Invocation<S::Output, S::Row>, ExecuteError> {
        let key = self.key();
        if self.executed {
            return Err(ExecuteError::AlreadyExecuted(key));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ExecuteError::NoRuntime)?;
        let body = self.json_request_body()?;

        let (progress, receiver) = ProgressReporter::channel();
        let request = ConnectorRequest {
            key,
            url: self.config.endpoint(key),
            credentials: Arc::clone(&self.credentials),
            body,
            progress: progress.clone(),
        };
        let connector = self.connector.clone();
        let decoders = (S::output_decoder(), S::row_decoder());
        self.executed = true;

        debug!(key = %key, url = %request.url, "executing data source");
        let span = info_span!("datasource", key = key.get());
        let handle = runtime.spawn(
            async move {
                let response = connector.oneshot(request).await;
                let delivered = response.is_ok();
                let result = complete(response, decoders.0, decoders.1);
                if delivered {
                    progress.report(Progress::Complete);
                }
                result
            }
            .instrument(span),
        );

        Ok(Invocation::new(key, receiver, handle))
    }

    /// Interpret one connector completion for this shape.
    #[must_use]
    pub fn complete(
        response: Result<RawResponse, TransportFault>,
    ) -> DataSourceResult<S::Output, S::Row> {
        complete(response, S::output_decoder(), S::row_decoder())
    }
}

/// The single parse dispatch: a transport fault, a success status, or a
/// failure status. Exactly one branch runs per completion.
pub(crate) fn complete<O, R>(
    response: Result<RawResponse, TransportFault>,
    output_decoder: Option<OutputDecoder<O>>,
    row_decoder: Option<RowDecoder<R>>,
) -> DataSourceResult<O, R> {
    let raw = match response {
        Ok(raw) => raw,
        Err(fault) => return Failure::Transport(fault).into(),
    };
    if raw.is_success() {
        match json::decode_success(&raw.body, output_decoder, row_decoder) {
            Ok(success) => DataSourceResult::Success(success),
            Err(fault) => {
                debug!(error = %fault, "success payload did not decode");
                Failure::Parse(fault).into()
            }
        }
    } else {
        json::decode_failure(raw.status, &raw.body).into()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
