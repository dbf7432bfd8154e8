use std::time::Duration;

use serde::Deserialize;

use crate::codec::DEFAULT_MAX_BODY_SIZE;

/// Per-connection settings.
///
/// Timeout hierarchy: `keep_alive_timeout_ms` bounds the idle wait for the first
/// byte of the next request once a response has been written, expiring closes the
/// connection silently. `request_timeout_ms` bounds reading one complete request,
/// head and body, counted from its first byte (from the connection start for the
/// first request); expiring answers `408` and closes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub read_buffer_size: usize,
    pub keep_alive_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_body_size: u64,
}

impl ConnectionConfig {
    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_millis(self.keep_alive_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { read_buffer_size: 8 * 1024, keep_alive_timeout_ms: 5_000, request_timeout_ms: 10_000, max_body_size: DEFAULT_MAX_BODY_SIZE }
    }
}
