//! Tracing middleware for connectors.
//!
//! Wraps each exchange in an `invocation` span and records its duration and
//! outcome, using `tracing` rather than a metrics crate.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use datasource_core::TransportFault;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::connector::ConnectorRequest;

// ---------------------------------------------------------------------------
// InvocationTraceLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments exchanges with timing and outcome.
#[derive(Debug, Clone, Copy)]
pub struct InvocationTraceLayer;

impl<S> Layer<S> for InvocationTraceLayer {
    type Service = InvocationTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InvocationTraceService { inner }
    }
}

// ---------------------------------------------------------------------------
// InvocationTraceService
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct InvocationTraceService<S> {
    inner: S,
}

impl<S> Service<ConnectorRequest> for InvocationTraceService<S>
where
    S: Service<ConnectorRequest, Error = TransportFault> + Send,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
{
    type Response = S::Response;
    type Error = TransportFault;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, TransportFault>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: ConnectorRequest) -> Self::Future {
        let key = request.key.get();
        let span = info_span!(
            "invocation",
            key = key,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(TransportFault::Timeout { .. }) => "timeout",
                    Err(_) => "error",
                };
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", outcome);

                tracing::info!(key, duration_ms, outcome, "exchange complete");

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
