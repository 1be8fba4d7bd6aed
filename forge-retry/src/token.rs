use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use forge_core::Error;

/// Opaque handle tracking one in-flight execution's retry state.
///
/// A token returned by [`crate::RetryStrategy::acquire_initial_token`] or
/// [`crate::RetryStrategy::refresh_retry_token`] is valid until it is
/// consumed by exactly one subsequent `refresh_retry_token`,
/// `record_success`, or terminal abandonment. [`RetryToken::consume`] is
/// the single choke point that enforces this: a second consumption attempt
/// deterministically fails with [`Error::IllegalToken`] rather than
/// silently succeeding.
pub struct RetryToken {
    scope: String,
    attempt: u32,
    consumed: Arc<AtomicBool>,
}

impl RetryToken {
    pub(crate) fn new(scope: impl Into<String>, attempt: u32) -> Self {
        Self {
            scope: scope.into(),
            attempt,
            consumed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The failure-domain key this token's bucket is scoped to.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// 1-based count of the attempt this token is currently tracking.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Mark this token as consumed. Fails if it already was.
    pub(crate) fn consume(&self) -> Result<(), Error> {
        if self.consumed.swap(true, Ordering::SeqCst) {
            Err(Error::IllegalToken)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_token_can_only_be_consumed_once() {
        let token = RetryToken::new("scope-a", 1);
        assert!(token.consume().is_ok());
        assert!(matches!(token.consume(), Err(Error::IllegalToken)));
    }
}
