use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub use axum::http::StatusCode;

pub const PATH_CACHE: &str = "/cache/{size}/{name}";
pub const PATH_HEALTH: &str = "/health";

/// Upper bound on generated bodies so a typo in a size cannot exhaust memory.
pub const DEFAULT_MAX_BODY: u64 = 64 * 1024 * 1024;

/// How the origin answers `/cache/...` requests.
#[derive(Debug, Clone, Copy)]
pub struct TestServerOptions {
    pub delay: Duration,
    pub status: StatusCode,
    pub max_body: u64,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            status: StatusCode::OK,
            max_body: DEFAULT_MAX_BODY,
        }
    }
}

impl TestServerOptions {
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    bytes_served: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn add_bytes_served(&self, n: u64) {
        self.bytes_served.fetch_add(n, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn bytes_served(&self) -> u64 {
        self.bytes_served.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    opts: TestServerOptions,
}

async fn handle_cache(
    State(state): State<AppState>,
    Path((size, _name)): Path<(u64, String)>,
) -> (StatusCode, Bytes) {
    state.stats.inc_requests_total();

    if !state.opts.delay.is_zero() {
        sleep(state.opts.delay).await;
    }

    if size > state.opts.max_body {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Bytes::from_static(b"payload too large"),
        );
    }

    let body = Bytes::from(vec![b'x'; size as usize]);
    state.stats.add_bytes_served(size);
    (state.opts.status, body)
}

async fn handle_health() -> &'static str {
    "ok"
}

pub fn router(stats: TestServerStats, opts: TestServerOptions) -> Router {
    Router::new()
        .route(PATH_CACHE, get(handle_cache))
        .route(PATH_HEALTH, get(handle_health))
        .with_state(AppState { stats, opts })
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerOptions::default()).await
    }

    pub async fn start_with(opts: TestServerOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(stats.clone(), opts);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            addr,
            base_url: format!("http://{addr}"),
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            // Slow handlers may still be sleeping; do not wait on them.
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
