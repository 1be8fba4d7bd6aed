use std::time::Instant;

use forge_core::{Context, Error};

use crate::interceptor::Interceptor;

/// Log level for [`Logged`] and [`Timed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

pub fn log_at_level(level: LogLevel, operation: &str, msg: &str) {
    match level {
        LogLevel::Trace => tracing::trace!(operation, "{}", msg),
        LogLevel::Debug => tracing::debug!(operation, "{}", msg),
        LogLevel::Info => tracing::info!(operation, "{}", msg),
        LogLevel::Warn => tracing::warn!(operation, "{}", msg),
        LogLevel::Error => tracing::error!(operation, "{}", msg),
    }
}

fn operation_name(context: &Context) -> String {
    context.operation().map(|id| id.to_string()).unwrap_or_else(|| "unknown".to_string())
}

/// Logs entry and exit of the whole call at the configured level (§9
/// "Built-in interceptors").
pub struct Logged {
    level: LogLevel,
}

impl Logged {
    pub fn info() -> Self {
        Self { level: LogLevel::Info }
    }

    pub fn debug() -> Self {
        Self { level: LogLevel::Debug }
    }

    pub fn trace() -> Self {
        Self { level: LogLevel::Trace }
    }

    pub fn level(level: LogLevel) -> Self {
        Self { level }
    }
}

impl Default for Logged {
    fn default() -> Self {
        Self::info()
    }
}

impl Interceptor for Logged {
    fn read_before_execution(&self, context: &mut Context) -> Result<(), Error> {
        log_at_level(self.level, &operation_name(context), "entering");
        Ok(())
    }

    fn read_after_execution(&self, context: &mut Context, error: Option<&Error>) -> Result<(), Error> {
        match error {
            Some(e) => log_at_level(LogLevel::Error, &operation_name(context), &format!("exiting with error: {e}")),
            None => log_at_level(self.level, &operation_name(context), "exiting"),
        }
        Ok(())
    }
}

/// Measures wall-clock latency for the whole call (§9 "Built-in
/// interceptors"). If `threshold_ms` is set, only logs when latency
/// exceeds it.
pub struct Timed {
    level: LogLevel,
    threshold_ms: Option<u64>,
}

impl Timed {
    pub fn info() -> Self {
        Self { level: LogLevel::Info, threshold_ms: None }
    }

    pub fn warn() -> Self {
        Self { level: LogLevel::Warn, threshold_ms: None }
    }

    pub fn threshold_ms(mut self, ms: u64) -> Self {
        self.threshold_ms = Some(ms);
        self
    }
}

impl Default for Timed {
    fn default() -> Self {
        Self::info()
    }
}

impl Interceptor for Timed {
    fn read_before_execution(&self, context: &mut Context) -> Result<(), Error> {
        context.insert(CallStart(Instant::now()));
        Ok(())
    }

    fn read_after_execution(&self, context: &mut Context, _error: Option<&Error>) -> Result<(), Error> {
        if let Some(CallStart(start)) = context.get::<CallStart>() {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            if self.threshold_ms.map(|t| elapsed_ms > t).unwrap_or(true) {
                log_at_level(self.level, &operation_name(context), &format!("elapsed_ms={elapsed_ms}"));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
struct CallStart(Instant);

/// Stamps a generated idempotency/request id onto the context during
/// `read_before_execution` if the caller didn't already supply one (§9
/// "Built-in interceptors").
#[derive(Clone, Copy, Default)]
pub struct RequestIdInterceptor;

impl Interceptor for RequestIdInterceptor {
    fn read_before_execution(&self, context: &mut Context) -> Result<(), Error> {
        if context.idempotency_token().is_none() {
            context.set_idempotency_token(uuid::Uuid::new_v4().to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_does_not_error_on_entry_or_exit() {
        let mut context = Context::new();
        let interceptor = Logged::debug();
        assert!(interceptor.read_before_execution(&mut context).is_ok());
        assert!(interceptor.read_after_execution(&mut context, None).is_ok());
    }

    #[test]
    fn timed_records_a_call_start_marker_in_the_context() {
        let mut context = Context::new();
        let interceptor = Timed::info();
        interceptor.read_before_execution(&mut context).unwrap();
        assert!(context.get::<CallStart>().is_some());
        assert!(interceptor.read_after_execution(&mut context, None).is_ok());
    }

    #[test]
    fn request_id_interceptor_only_stamps_a_missing_token() {
        let mut context = Context::new();
        RequestIdInterceptor.read_before_execution(&mut context).unwrap();
        let generated = context.idempotency_token().unwrap().to_string();
        assert!(!generated.is_empty());

        let mut context_with_token = Context::new().with_idempotency_token("caller-supplied");
        RequestIdInterceptor.read_before_execution(&mut context_with_token).unwrap();
        assert_eq!(context_with_token.idempotency_token(), Some("caller-supplied"));
    }
}
