use bytes::Bytes;
use http_body_util::{BodyExt as _, Empty};
use hyper::Request;
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HttpTransportErrorKind {
    InvalidUrl,
    OnlyHttpSupported,
    RequestBuild,
    Request,
    Timeout,
    BodyRead,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("only http:// URLs are supported for now: {0}")]
    OnlyHttpSupported(String),

    #[error("http request build failed: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("http request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("http request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    BodyRead(#[from] hyper::Error),
}

impl Error {
    #[must_use]
    pub fn transport_error_kind(&self) -> HttpTransportErrorKind {
        match self {
            Self::InvalidUrl(_) => HttpTransportErrorKind::InvalidUrl,
            Self::OnlyHttpSupported(_) => HttpTransportErrorKind::OnlyHttpSupported,
            Self::RequestBuild(_) => HttpTransportErrorKind::RequestBuild,
            Self::Request(_) => HttpTransportErrorKind::Request,
            Self::Timeout(_) => HttpTransportErrorKind::Timeout,
            Self::BodyRead(_) => HttpTransportErrorKind::BodyRead,
        }
    }

    /// True for the request deadline and for connector-level timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Request(err) => has_timed_out_io_source(err),
            _ => false,
        }
    }
}

fn has_timed_out_io_source(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut cur = err.source();
    while let Some(src) = cur {
        if let Some(io) = src.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::TimedOut
        {
            return true;
        }
        cur = src.source();
    }
    false
}

/// Status and size of a fully read response. The body itself is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub bytes_received: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientConfig {
    pub connect_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpConnector, Empty<Bytes>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(HttpClientConfig::default())
    }
}

impl HttpClient {
    pub fn new(cfg: HttpClientConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);
        connector.set_nodelay(true);
        connector.set_connect_timeout(cfg.connect_timeout);

        let inner = Client::builder(TokioExecutor::new()).build(connector);

        Self { inner }
    }

    pub async fn request(&self, req: HttpRequest) -> Result<HttpResponse> {
        let parsed = url::Url::parse(&req.url).map_err(|_| Error::InvalidUrl(req.url.clone()))?;
        if parsed.scheme() != "http" {
            return Err(Error::OnlyHttpSupported(req.url));
        }

        let uri: hyper::Uri = req
            .url
            .parse()
            .map_err(|_| Error::InvalidUrl(req.url.clone()))?;

        let request: Request<Empty<Bytes>> = Request::builder()
            .method(req.method)
            .uri(uri)
            .body(Empty::new())?;

        // The deadline covers the whole exchange, body included.
        let exchange = async {
            let res: hyper::Response<Incoming> = self.inner.request(request).await?;
            let (parts, body) = res.into_parts();
            let received = body.collect().await?.to_bytes().len() as u64;
            Ok::<_, Error>((parts.status.as_u16(), received))
        };

        let (status, bytes_received) = match req.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, exchange).await {
                Ok(res) => res?,
                Err(_) => return Err(Error::Timeout(timeout)),
            },
            None => exchange.await?,
        };

        Ok(HttpResponse {
            status,
            bytes_received,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: http::Method,
    pub url: String,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: http::Method::GET,
            url: url.to_string(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_http_scheme() {
        let client = HttpClient::default();
        match client.request(HttpRequest::get("https://example.com/")).await {
            Err(Error::OnlyHttpSupported(url)) => assert_eq!(url, "https://example.com/"),
            other => panic!("expected OnlyHttpSupported, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_garbage_url() {
        let client = HttpClient::default();
        let err = match client.request(HttpRequest::get("not a url")).await {
            Err(err) => err,
            Ok(res) => panic!("expected error, got {res:?}"),
        };
        assert_eq!(err.transport_error_kind(), HttpTransportErrorKind::InvalidUrl);
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_error_is_classified_as_timeout() {
        let err = Error::Timeout(Duration::from_millis(10));
        assert!(err.is_timeout());
        assert_eq!(err.transport_error_kind().to_string(), "timeout");
    }
}
