use std::time::Duration;

use forge_core::{Clock, Error, TransportFault};

/// Whether an error is safe to retry, before any idempotency signal is
/// applied.
///
/// `Maybe` always collapses to `No` at the point the strategy asks "should
/// I retry" unless upgraded by an idempotency signal (§9 open question:
/// `RetrySafety::MAYBE` is treated as `NO` unless an idempotency token or
/// an inherently-idempotent operation establishes it as safe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrySafety {
    Yes,
    No,
    Maybe,
}

impl RetrySafety {
    /// Resolve to a plain retry/no-retry decision given whether this call
    /// carries an idempotency signal (an idempotency token, or the
    /// operation is modeled `readonly`/`idempotent`).
    pub fn resolve(self, idempotent: bool) -> bool {
        match self {
            RetrySafety::Yes => true,
            RetrySafety::No => false,
            RetrySafety::Maybe => idempotent,
        }
    }
}

/// The classifier's verdict for one error occurrence.
#[derive(Debug, Clone)]
pub struct Classification {
    pub safety: RetrySafety,
    pub throttle: bool,
    pub retry_after: Option<Duration>,
}

impl Classification {
    pub fn should_retry(&self, idempotent: bool) -> bool {
        self.safety.resolve(idempotent)
    }
}

/// Everything the classifier needs to judge one error, gathered by the
/// pipeline before it asks the retry strategy to refresh a token.
pub struct ClassifyInput<'a> {
    pub error: &'a Error,
    /// HTTP status of the response that produced `error`, if any (absent
    /// for errors raised before a response was received, e.g. connect
    /// failures).
    pub http_status: Option<u16>,
    /// Raw `retry-after` header value, if the response carried one —
    /// either an integer seconds count or an RFC 1123 HTTP date.
    pub retry_after_header: Option<&'a str>,
    /// Whether this call carries an idempotency signal: an explicit
    /// idempotency token, or the operation is modeled
    /// `readonly`/`idempotent`.
    pub idempotent: bool,
    /// The matched error shape's `retryable` trait, if modeled.
    pub retryable_hint: Option<bool>,
    /// The matched error shape's `throttling` trait, if modeled.
    pub throttling_hint: Option<bool>,
}

/// Classify one error occurrence per §4.4.
pub fn classify(input: ClassifyInput<'_>, clock: &dyn Clock) -> Classification {
    let retry_after = input
        .retry_after_header
        .and_then(|header| parse_retry_after(header, clock));

    let (mut safety, mut throttle) = match input.error {
        Error::Transport { fault, .. } => {
            if *fault == TransportFault::ConnectTimeout {
                (RetrySafety::Yes, false)
            } else {
                (RetrySafety::No, false)
            }
        }
        Error::Serialization(_)
        | Error::Deserialization { .. }
        | Error::RetryExhausted { .. }
        | Error::Cancelled
        | Error::Timeout
        | Error::IllegalToken => (RetrySafety::No, false),
        Error::Modeled(_) | Error::Unmodeled { .. } => classify_by_status(input.http_status, input.idempotent),
    };

    // Model hints (`retryable`, `throttling` traits) take precedence over
    // the status-family default, per §4.4.
    if let Some(retryable) = input.retryable_hint {
        safety = if retryable { RetrySafety::Yes } else { RetrySafety::No };
    }
    if let Some(throttling) = input.throttling_hint {
        throttle = throttling;
        if throttling {
            safety = RetrySafety::Yes;
        }
    }

    Classification {
        safety,
        throttle,
        retry_after,
    }
}

fn classify_by_status(status: Option<u16>, idempotent: bool) -> (RetrySafety, bool) {
    match status {
        Some(429) | Some(503) => (RetrySafety::Yes, true),
        Some(s) if (500..600).contains(&s) => {
            if idempotent {
                (RetrySafety::Yes, false)
            } else {
                (RetrySafety::Maybe, false)
            }
        }
        Some(s) if (400..500).contains(&s) => (RetrySafety::No, false),
        _ => (RetrySafety::Maybe, false),
    }
}

/// Parse a `retry-after` header value (seconds, or an RFC 1123 HTTP date)
/// into a `Duration` relative to `clock`.
fn parse_retry_after(header: &str, clock: &dyn Clock) -> Option<Duration> {
    let header = header.trim();
    if let Ok(secs) = header.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let target_millis = forge_core::httpdate::parse_rfc1123_millis(header)?;
    let now_millis = clock.now_millis();
    let delta = target_millis - now_millis;
    Some(Duration::from_millis(delta.max(0) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::FixedClock;

    #[test]
    fn connect_timeout_is_retry_safe_and_not_throttled() {
        let error = Error::transport(TransportFault::ConnectTimeout, "timed out");
        let classification = classify(
            ClassifyInput {
                error: &error,
                http_status: None,
                retry_after_header: None,
                idempotent: false,
                retryable_hint: None,
                throttling_hint: None,
            },
            &FixedClock::new(0),
        );
        assert!(classification.should_retry(false));
        assert!(!classification.throttle);
    }

    #[test]
    fn status_429_is_retry_safe_and_throttled() {
        let error = Error::Unmodeled {
            fault: forge_core::Fault::Client,
            message: "throttled".into(),
            raw: Default::default(),
        };
        let classification = classify(
            ClassifyInput {
                error: &error,
                http_status: Some(429),
                retry_after_header: None,
                idempotent: false,
                retryable_hint: None,
                throttling_hint: None,
            },
            &FixedClock::new(0),
        );
        assert!(classification.should_retry(false));
        assert!(classification.throttle);
    }

    #[test]
    fn bare_5xx_without_idempotency_downgrades_to_no_retry() {
        let error = Error::Unmodeled {
            fault: forge_core::Fault::Server,
            message: "boom".into(),
            raw: Default::default(),
        };
        let classification = classify(
            ClassifyInput {
                error: &error,
                http_status: Some(500),
                retry_after_header: None,
                idempotent: false,
                retryable_hint: None,
                throttling_hint: None,
            },
            &FixedClock::new(0),
        );
        assert_eq!(classification.safety, RetrySafety::Maybe);
        assert!(!classification.should_retry(false));
        assert!(classification.should_retry(true));
    }

    #[test]
    fn non_429_4xx_is_never_retry_safe() {
        let error = Error::Unmodeled {
            fault: forge_core::Fault::Client,
            message: "bad request".into(),
            raw: Default::default(),
        };
        let classification = classify(
            ClassifyInput {
                error: &error,
                http_status: Some(400),
                retry_after_header: None,
                idempotent: true,
                retryable_hint: None,
                throttling_hint: None,
            },
            &FixedClock::new(0),
        );
        assert!(!classification.should_retry(true));
    }

    #[test]
    fn retry_after_as_http_date_is_relative_to_the_clock() {
        let clock = FixedClock::from_rfc3339("2015-10-21T05:28:00Z");
        let error = Error::Unmodeled {
            fault: forge_core::Fault::Server,
            message: "unavailable".into(),
            raw: Default::default(),
        };
        let classification = classify(
            ClassifyInput {
                error: &error,
                http_status: Some(503),
                retry_after_header: Some("Wed, 21 Oct 2015 07:28:00 GMT"),
                idempotent: false,
                retryable_hint: None,
                throttling_hint: None,
            },
            &clock,
        );
        assert_eq!(classification.retry_after, Some(Duration::from_secs(2 * 3600)));
        assert!(classification.throttle);
    }

    #[test]
    fn model_hint_overrides_status_default() {
        let error = Error::Modeled(forge_core::ModeledError {
            shape: forge_schema::ShapeId::new("com.example", "SomeError"),
            payload: forge_schema::Document::Null,
            http_status: Some(400),
        });
        let classification = classify(
            ClassifyInput {
                error: &error,
                http_status: Some(400),
                retry_after_header: None,
                idempotent: false,
                retryable_hint: Some(true),
                throttling_hint: None,
            },
            &FixedClock::new(0),
        );
        assert!(classification.should_retry(false));
    }
}
