use std::time::Duration;

use forge_core::Error;

use crate::bucket::{BucketParams, BucketRegistry};
use crate::classify::Classification;
use crate::token::RetryToken;

/// The token lifecycle a retry-aware execution pipeline drives (§4.4).
///
/// `refresh_retry_token` takes the already-computed [`Classification`] for
/// `cause` rather than recomputing it, since only the caller (the
/// pipeline, in `forge`) has the idempotency and model-hint context
/// `classify` needs; this trait only owns the token/bucket bookkeeping.
pub trait RetryStrategy: Send + Sync {
    /// `max_attempts >= 1`; `1` means no retry.
    fn max_attempts(&self) -> u32;

    fn acquire_initial_token(&self, scope: &str) -> Result<(RetryToken, Duration), Error>;

    fn refresh_retry_token(
        &self,
        token: RetryToken,
        cause: &Error,
        classification: &Classification,
        suggested_delay: Option<Duration>,
    ) -> Result<(RetryToken, Duration), Error>;

    fn record_success(&self, token: RetryToken) -> Result<RetryToken, Error>;
}

/// Derive the scope key a retry bucket is addressed by: the call's
/// configured `retry_scope` if set, otherwise the operation id itself, so
/// two operations never accidentally share a bucket when no explicit scope
/// was configured.
pub fn scope_key(retry_scope: Option<&str>, operation_id: &str) -> String {
    retry_scope.unwrap_or(operation_id).to_string()
}

/// The default [`RetryStrategy`]: a scope-keyed token bucket gating a
/// bounded number of attempts.
pub struct StandardRetryStrategy {
    max_attempts: u32,
    buckets: BucketRegistry,
}

impl StandardRetryStrategy {
    pub fn new(max_attempts: u32) -> Self {
        Self::with_bucket_params(max_attempts, BucketParams::default())
    }

    pub fn with_bucket_params(max_attempts: u32, params: BucketParams) -> Self {
        assert!(max_attempts >= 1, "max_attempts must be at least 1");
        Self {
            max_attempts,
            buckets: BucketRegistry::new(params),
        }
    }
}

impl RetryStrategy for StandardRetryStrategy {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn acquire_initial_token(&self, scope: &str) -> Result<(RetryToken, Duration), Error> {
        Ok((RetryToken::new(scope, 1), Duration::ZERO))
    }

    fn refresh_retry_token(
        &self,
        token: RetryToken,
        cause: &Error,
        classification: &Classification,
        suggested_delay: Option<Duration>,
    ) -> Result<(RetryToken, Duration), Error> {
        token.consume()?;
        let completed_attempts = token.attempt();
        let next_attempt = completed_attempts + 1;

        if next_attempt > self.max_attempts {
            tracing::debug!(scope = token.scope(), attempts = completed_attempts, "retry exhausted: max attempts reached");
            return Err(Error::RetryExhausted {
                attempts: completed_attempts,
                cause: Box::new(cause.clone()),
            });
        }

        let cost = if classification.throttle {
            self.buckets.throttle_cost()
        } else {
            self.buckets.retry_cost()
        };
        if !self.buckets.try_withdraw(token.scope(), cost) {
            tracing::debug!(scope = token.scope(), "retry exhausted: bucket empty");
            return Err(Error::RetryExhausted {
                attempts: completed_attempts,
                cause: Box::new(cause.clone()),
            });
        }

        let delay = suggested_delay.or(classification.retry_after).unwrap_or(Duration::ZERO);
        Ok((RetryToken::new(token.scope(), next_attempt), delay))
    }

    fn record_success(&self, token: RetryToken) -> Result<RetryToken, Error> {
        token.consume()?;
        self.buckets.deposit(token.scope(), self.buckets.retry_cost());
        Ok(RetryToken::new(token.scope(), token.attempt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RetrySafety;

    fn classification(safety: RetrySafety, throttle: bool) -> Classification {
        Classification {
            safety,
            throttle,
            retry_after: None,
        }
    }

    #[test]
    fn scope_key_falls_back_to_operation_id() {
        assert_eq!(scope_key(None, "com.example#GetWidget"), "com.example#GetWidget");
        assert_eq!(scope_key(Some("arn:shared"), "com.example#GetWidget"), "arn:shared");
    }

    #[test]
    fn refresh_denies_once_max_attempts_is_exceeded() {
        let strategy = StandardRetryStrategy::new(2);
        let (token, _) = strategy.acquire_initial_token("scope").unwrap();
        let cause = Error::transport(forge_core::TransportFault::ConnectTimeout, "timeout");
        let (token, _) = strategy
            .refresh_retry_token(token, &cause, &classification(RetrySafety::Yes, false), None)
            .unwrap();
        let result = strategy.refresh_retry_token(token, &cause, &classification(RetrySafety::Yes, false), None);
        assert!(matches!(result, Err(Error::RetryExhausted { .. })));
    }

    #[test]
    fn reusing_a_consumed_token_is_illegal() {
        let strategy = StandardRetryStrategy::new(3);
        let (token, _) = strategy.acquire_initial_token("scope").unwrap();
        assert!(token.consume().is_ok());
        // The token was already consumed by the line above (simulating a
        // prior transition); a second transition on the same token object
        // must fail deterministically rather than silently succeeding.
        let cause = Error::transport(forge_core::TransportFault::ConnectTimeout, "timeout");
        let result = strategy.refresh_retry_token(token, &cause, &classification(RetrySafety::Yes, false), None);
        assert!(matches!(result, Err(Error::IllegalToken)));
    }

    #[test]
    fn empty_bucket_exhausts_retries_before_max_attempts() {
        let params = BucketParams {
            capacity: 1.0,
            refill_per_sec: 0.0,
            retry_cost: 1.0,
            throttle_cost: 1.0,
        };
        let strategy = StandardRetryStrategy::with_bucket_params(10, params);
        let (token, _) = strategy.acquire_initial_token("scope").unwrap();
        let cause = Error::transport(forge_core::TransportFault::ConnectTimeout, "timeout");
        let (token, _) = strategy
            .refresh_retry_token(token, &cause, &classification(RetrySafety::Yes, false), None)
            .unwrap();
        let result = strategy.refresh_retry_token(token, &cause, &classification(RetrySafety::Yes, false), None);
        assert!(matches!(result, Err(Error::RetryExhausted { .. })));
    }
}
