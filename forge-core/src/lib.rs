//! Execution-pipeline collaborators shared by every forge crate: the
//! request-scoped [`Context`] map, the replayable/one-shot [`DataStream`],
//! the [`Endpoint`]/[`EndpointResolver`] pair, the layered [`ClientConfig`]
//! loader, the generic [`Plugin`]/[`PluginIdempotence`] builder helper, and
//! the [`Error`] taxonomy the pipeline and protocol engine both raise into.
//!
//! This crate deliberately has no knowledge of HTTP, auth, or retries — it
//! sits below `forge-http`, `forge-auth`, and `forge-retry` so none of them
//! need to depend on each other, and the `forge` facade ties all of them
//! together around the types defined here.

pub mod clock;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod httpdate;
pub mod plugin;
pub mod stream;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    ClientConfig, ConfigError, ConfigProperties, ConfigValue, DefaultSecretResolver,
    FromConfigValue, SecretResolver,
};
pub use context::Context;
pub use endpoint::{Endpoint, EndpointResolver, StaticEndpointResolver};
pub use error::{Error, Fault, ModeledError, RawResponse, TransportFault};
pub use plugin::{Plugin, PluginIdempotence};
pub use stream::DataStream;
pub use tokio_util::sync::CancellationToken;
