//! The interceptor chain (§4.5): a fixed, ordered hook set any collaborator
//! can observe or transform during one attempt, dispatched by
//! [`InterceptorChain`] with last-error-wins semantics for `read_*` hooks
//! and abort-on-first-error threading for `modify_*` hooks. Ships three
//! ready-to-use interceptors: [`Logged`], [`Timed`], and
//! [`RequestIdInterceptor`].

pub mod builtin;
pub mod chain;
pub mod interceptor;
pub mod phase;

pub use builtin::{log_at_level, LogLevel, Logged, RequestIdInterceptor, Timed};
pub use chain::InterceptorChain;
pub use interceptor::Interceptor;
pub use phase::Phase;

pub mod prelude {
    //! Re-exports of the most commonly used interceptor types.
    pub use crate::{InterceptorChain, Interceptor, Logged, RequestIdInterceptor, Timed};
}
