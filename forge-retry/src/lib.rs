//! Retry token lifecycle, scope-keyed token bucket, and error
//! classification for forge RPC clients.
//!
//! The execution pipeline in `forge` drives a [`RetryStrategy`] through
//! `acquire_initial_token` → (serialize, sign, transmit, deserialize) →
//! `refresh_retry_token`/`record_success`, classifying each failure with
//! [`classify`] before deciding whether to ask for a refresh at all.
//! Tokens of the same scope (§3 "Retry token", §4.4 "Scope") share one
//! token bucket; tokens of different scopes never interact.

pub mod bucket;
pub mod classify;
pub mod strategy;
pub mod token;

pub use bucket::{BucketParams, BucketRegistry};
pub use classify::{classify, Classification, ClassifyInput, RetrySafety};
pub use strategy::{scope_key, RetryStrategy, StandardRetryStrategy};
pub use token::RetryToken;
