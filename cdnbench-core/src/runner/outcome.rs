use serde::{Deserialize, Serialize};

/// The only status code counted as a successful request.
pub const SUCCESS_STATUS: u16 = 200;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Request-level connect or read deadline exceeded.
    Timeout,
    /// Connection-level failure below HTTP (DNS, refused, reset).
    TransportError,
    /// Still outstanding when the phase gate closed.
    Incomplete,
    /// Failure inside the dispatch machinery (panicked or lost task).
    ExecutionError,
    /// Did not wind down within the cancellation drain window after the gate closed.
    BatchTimeout,
}

/// Classified result of a single request attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestOutcome {
    pub latency_ms: f64,
    pub status: Option<u16>,
    pub error: Option<ErrorKind>,
    pub bytes_received: u64,
}

impl RequestOutcome {
    pub fn response(latency_ms: f64, status: u16) -> Self {
        Self {
            latency_ms,
            status: Some(status),
            error: None,
            bytes_received: 0,
        }
    }

    pub fn failed(latency_ms: f64, kind: ErrorKind) -> Self {
        Self {
            latency_ms,
            status: None,
            error: Some(kind),
            bytes_received: 0,
        }
    }

    #[must_use]
    pub fn with_bytes_received(mut self, bytes: u64) -> Self {
        self.bytes_received = bytes;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(SUCCESS_STATUS)
    }
}
