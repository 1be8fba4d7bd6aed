use forge_http::HttpRequestParts;

const TRACE_HEADER: &str = "x-amzn-trace-id";

/// Stamps the outgoing request with the trace header used to detect an SDK
/// call recursively re-entering itself (§4.3 "Recursion-detection
/// plugin"). Never overwrites a value already present, whether set by the
/// caller or a previous attempt.
#[derive(Clone, Debug, Default)]
pub struct RecursionDetectionGuard {
    trace_id: Option<String>,
}

impl RecursionDetectionGuard {
    /// Read the trace id from the named environment variable, if set.
    pub fn from_env(var: &str) -> Self {
        Self {
            trace_id: std::env::var(var).ok(),
        }
    }

    pub fn with_value(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: Some(trace_id.into()),
        }
    }

    pub fn apply(&self, request: &mut HttpRequestParts) {
        let Some(trace_id) = &self.trace_id else {
            return;
        };
        let already_set = request.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(TRACE_HEADER));
        if !already_set {
            request.headers.push((TRACE_HEADER.to_string(), trace_id.clone()));
        }
    }
}
