//! In-process connector with scripted responses.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use datasource_core::{Progress, TransportFault};
use parking_lot::Mutex;
use tower::Service;

use super::{ConnectorRequest, RawResponse};

type Responder = dyn Fn(&ConnectorRequest) -> Result<RawResponse, TransportFault> + Send + Sync;

/// Connector that never touches the network.
///
/// Reports the same milestones as [`super::HttpConnector`] and records every
/// request body it was given, so operations can be exercised end to end
/// without a server.
#[derive(Clone)]
pub struct CannedConnector {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl std::fmt::Debug for CannedConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CannedConnector")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl CannedConnector {
    /// Answer every request with the same status and body.
    #[must_use]
    pub fn respond(status: u16, body: impl Into<String>) -> Self {
        let response = RawResponse::new(status, body);
        Self::from_fn(move |_| Ok(response.clone()))
    }

    /// Fail every request with the same fault.
    #[must_use]
    pub fn failing(fault: TransportFault) -> Self {
        Self::from_fn(move |_| Err(fault.clone()))
    }

    /// Compute each response from the request, e.g. to echo inputs back.
    #[must_use]
    pub fn from_fn(
        responder: impl Fn(&ConnectorRequest) -> Result<RawResponse, TransportFault>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            delay: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Hold each response for `delay` after the request is "sent".
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Request bodies received so far, in call order.
    #[must_use]
    pub fn request_bodies(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

impl Service<ConnectorRequest> for CannedConnector {
    type Response = RawResponse;
    type Error = TransportFault;
    type Future = Pin<Box<dyn Future<Output = Result<RawResponse, TransportFault>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ConnectorRequest) -> Self::Future {
        self.seen.lock().push(request.body.clone());
        let outcome = (self.responder)(&request);
        let delay = self.delay;
        let progress = request.progress;

        Box::pin(async move {
            match outcome {
                Ok(response) => {
                    progress.report(Progress::Connected);
                    progress.report(Progress::RequestSent);
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    progress.report(Progress::ResponseReceived);
                    progress.report(Progress::Processing);
                    Ok(response)
                }
                Err(fault) => {
                    if !matches!(fault, TransportFault::Connect(_)) {
                        progress.report(Progress::Connected);
                    }
                    progress.report(Progress::Error);
                    Err(fault)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use datasource_core::{Credentials, DataSourceKey};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use super::*;
    use crate::connector::ProgressReporter;

    fn request(body: &str) -> (ConnectorRequest, mpsc::UnboundedReceiver<Progress>) {
        let (progress, rx) = ProgressReporter::channel();
        let request = ConnectorRequest {
            key: DataSourceKey(1791),
            url: "http://localhost/".to_string(),
            credentials: Arc::new(Credentials::new("u", "p")),
            body: body.to_string(),
            progress,
        };
        (request, rx)
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<Progress>) -> Vec<Progress> {
        let mut out = Vec::new();
        while let Ok(p) = rx.try_recv() {
            out.push(p);
        }
        out
    }

    #[tokio::test]
    async fn canned_response_reports_through_processing() {
        let connector = CannedConnector::respond(200, "{}");
        let (req, rx) = request(r#"{"Part_No":"ABC"}"#);
        let response = connector.clone().oneshot(req).await.unwrap();
        assert_eq!(response, RawResponse::new(200, "{}"));
        assert_eq!(
            drain(rx),
            vec![
                Progress::Connected,
                Progress::RequestSent,
                Progress::ResponseReceived,
                Progress::Processing
            ]
        );
        assert_eq!(connector.request_bodies(), vec![r#"{"Part_No":"ABC"}"#]);
    }

    #[tokio::test]
    async fn connect_fault_reports_error_only() {
        let connector = CannedConnector::failing(TransportFault::Connect("refused".into()));
        let (req, rx) = request("{}");
        let fault = connector.oneshot(req).await.unwrap_err();
        assert_eq!(fault, TransportFault::Connect("refused".into()));
        assert_eq!(drain(rx), vec![Progress::Error]);
    }

    #[tokio::test]
    async fn responder_sees_the_request() {
        let connector =
            CannedConnector::from_fn(|req| Ok(RawResponse::new(200, req.body.to_uppercase())));
        let (req, _rx) = request("abc");
        assert_eq!(connector.oneshot(req).await.unwrap().body, "ABC");
    }
}
