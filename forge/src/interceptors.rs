use forge_auth::RecursionDetectionGuard;
use forge_core::{Context, Error};
use forge_http::HttpRequestParts;
use forge_utils::Interceptor;

/// Bridges [`RecursionDetectionGuard`] into the interceptor chain: stamps
/// `x-amzn-trace-id` on every attempt right before transmit, the same
/// point a signature would already have been computed over the rest of
/// the request (§4.3 "Recursion-detection plugin").
pub struct RecursionDetectionInterceptor(RecursionDetectionGuard);

impl RecursionDetectionInterceptor {
    pub fn new(guard: RecursionDetectionGuard) -> Self {
        Self(guard)
    }

    /// Reads `_X_AMZN_TRACE_ID`, the conventional Lambda execution
    /// environment variable, if present.
    pub fn from_lambda_env() -> Self {
        Self(RecursionDetectionGuard::from_env("_X_AMZN_TRACE_ID"))
    }
}

impl Interceptor for RecursionDetectionInterceptor {
    fn modify_before_transmit(&self, _context: &mut Context, mut request: HttpRequestParts) -> Result<HttpRequestParts, Error> {
        self.0.apply(&mut request);
        Ok(request)
    }
}
