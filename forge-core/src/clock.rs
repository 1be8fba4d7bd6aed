use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time source threaded through the [`Context`](crate::Context) so
/// that retry-after and timeout math can be driven by a fixed clock in
/// tests instead of `SystemTime::now()`.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// The real wall clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// A clock pinned to one instant, for deterministic tests (e.g. computing
/// `retry-after` relative to a fixed `2015-10-21T05:28:00Z`).
#[derive(Clone, Copy)]
pub struct FixedClock {
    millis: i64,
}

impl FixedClock {
    pub fn new(millis: i64) -> Self {
        Self { millis }
    }

    /// Parse an RFC 3339 timestamp into a fixed clock. Panics on malformed
    /// input; intended for test fixtures only.
    pub fn from_rfc3339(s: &str) -> Self {
        let millis = crate::httpdate::parse_rfc3339_millis(s)
            .unwrap_or_else(|| panic!("invalid RFC 3339 timestamp: {s}"));
        Self { millis }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }
}

pub fn system() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}
