//! Timeout middleware for connectors.
//!
//! Fails an exchange that outlives its deadline with `TransportFault::Timeout`
//! and reports the `Error` milestone on the invocation's progress stream.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use datasource_core::{Progress, TransportFault};
use tower::{Layer, Service};
use tracing::warn;

use crate::connector::ConnectorRequest;

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that bounds each exchange. `None` passes calls through.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    timeout: Option<Duration>,
}

impl TimeoutLayer {
    #[must_use]
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            timeout: self.timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces the exchange deadline.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    timeout: Option<Duration>,
}

impl<S> Service<ConnectorRequest> for TimeoutService<S>
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
        let Some(duration) = self.timeout else {
            return Box::pin(self.inner.call(request));
        };
        let progress = request.progress.clone();
        let key = request.key;
        let fut = self.inner.call(request);
        Box::pin(async move {
            match tokio::time::timeout(duration, fut).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    let after_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                    warn!(key = %key, after_ms, "exchange timed out");
                    progress.report(Progress::Error);
                    Err(TransportFault::Timeout { after_ms })
                }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
