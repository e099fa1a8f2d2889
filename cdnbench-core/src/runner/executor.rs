use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;

use super::config::RunConfig;
use super::outcome::{ErrorKind, RequestOutcome};
use crate::http::{HttpClient, HttpClientConfig, HttpRequest};

pub type RequestFuture<'a> = Pin<Box<dyn Future<Output = RequestOutcome> + Send + 'a>>;

/// Performs one request against a target and classifies what happened.
///
/// Implementations never retry: one call is one unit of observation.
pub trait RequestExecutor: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn execute<'a>(&'a self, url: &'a str) -> RequestFuture<'a>;
}

/// Issues a single HTTP GET per call.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: HttpClient,
    request_timeout: Duration,
}

impl HttpExecutor {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        let client = HttpClient::new(HttpClientConfig {
            connect_timeout: Some(connect_timeout),
        });

        Self {
            client,
            request_timeout,
        }
    }

    pub fn from_config(cfg: &RunConfig) -> Self {
        Self::new(cfg.connect_timeout, cfg.request_timeout)
    }
}

impl RequestExecutor for HttpExecutor {
    fn name(&self) -> &'static str {
        "http"
    }

    fn execute<'a>(&'a self, url: &'a str) -> RequestFuture<'a> {
        Box::pin(async move {
            let started = Instant::now();
            let req = HttpRequest::get(url).with_timeout(self.request_timeout);
            let res = self.client.request(req).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            match res {
                Ok(res) => RequestOutcome::response(latency_ms, res.status)
                    .with_bytes_received(res.bytes_received),
                Err(err) if err.is_timeout() => {
                    tracing::debug!(url, error = %err, "request timed out");
                    RequestOutcome::failed(latency_ms, ErrorKind::Timeout)
                }
                Err(err) => {
                    tracing::debug!(
                        url,
                        kind = %err.transport_error_kind(),
                        error = %err,
                        "request failed"
                    );
                    RequestOutcome::failed(latency_ms, ErrorKind::TransportError)
                }
            }
        })
    }
}
