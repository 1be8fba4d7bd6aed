//! Schema-driven RPC client execution pipeline (§1–§4).
//!
//! This crate is the facade that ties the lower layers together:
//! `forge-schema` describes the service, `forge-http` binds values onto
//! HTTP request/response parts, `forge-auth` resolves and signs,
//! `forge-retry` decides whether a failed attempt gets another try,
//! `forge-transport` sends the bytes, and `forge-utils` gives every one of
//! those layers a hook into the call via the interceptor chain. `Client`
//! wraps one [`CallConfig`] snapshot and exposes `invoke` as the single
//! entry point described in §6 ("Operation invocation").
//!
//! ```ignore
//! let client = Client::builder()
//!     .registry(registry)
//!     .default_namespace("com.example")
//!     .endpoint(Endpoint::new("https://example.com"))
//!     .build()?;
//! let output = client.invoke("com.example#GetWidget", input, None).await?;
//! ```

pub mod config;
pub mod interceptors;
pub mod operation;
pub mod pipeline;
pub mod user_agent;

pub use config::{CallConfig, CallConfigBuilder, CallOverride};
pub use interceptors::RecursionDetectionInterceptor;
pub use user_agent::UserAgentBuilder;

use forge_core::Error;
use forge_schema::{Document, ShapeId};

/// A bound RPC client: one [`CallConfig`] snapshot plus the schema registry
/// it was built from, exposed behind the single `invoke` entry point.
///
/// Cheap to clone — every field inside [`CallConfig`] is an `Arc` or a
/// structurally-shared `SchemaRegistry`, so handing out a `Client` per
/// logical service consumer (§5 "Shared resources") never duplicates the
/// transport, retry bucket, or auth catalog underneath it.
#[derive(Clone)]
pub struct Client {
    config: CallConfig,
}

impl Client {
    pub fn builder() -> CallConfigBuilder {
        CallConfig::builder()
    }

    pub fn from_config(config: CallConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CallConfig {
        &self.config
    }

    /// Look up `operation_id` in the client's schema registry and drive it
    /// through [`pipeline::invoke`]. `operation_id` accepts either an
    /// absolute shape id (`namespace#Name`) or a bare name resolved against
    /// the client's default namespace.
    pub async fn invoke(&self, operation_id: &str, input: Document, call_override: Option<CallOverride>) -> Result<Document, Error> {
        let shape_id = self.resolve_operation_id(operation_id);
        let operation = self
            .config
            .registry
            .operation(&shape_id)
            .ok_or_else(|| Error::serialization(format!("no such operation: {shape_id}")))?;
        pipeline::invoke(operation, input, &self.config, call_override).await
    }

    fn resolve_operation_id(&self, operation_id: &str) -> ShapeId {
        if operation_id.contains('#') {
            ShapeId::parse(operation_id)
        } else {
            ShapeId::new(&self.config.default_namespace, operation_id)
        }
    }
}

pub mod prelude {
    //! Re-exports of the most commonly used top-level types.
    pub use crate::{CallConfig, CallConfigBuilder, CallOverride, Client};
    pub use forge_core::{CancellationToken, Context, DataStream, Endpoint, Error};
    pub use forge_schema::{Document, OperationSchema, SchemaRegistry, ShapeId};
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use forge_core::Endpoint;
    use forge_http::HttpResponseParts;
    use forge_schema::{Member, Shape, ShapeId, ShapeKind};
    use forge_test::{MockMatcher, MockOutcome, MockTransport};
    use forge_transport::Transport;

    use super::*;

    fn echo_registry() -> forge_schema::SchemaRegistry {
        forge_schema::SchemaRegistry::builder()
            .shape(
                Shape::new(ShapeId::new("com.example", "EchoInput"), ShapeKind::Structure)
                    .with_member(Member::new("id", ShapeId::new("smithy.api", "String")).with_trait("httpLabel", true.into())),
            )
            .shape(Shape::new(ShapeId::new("com.example", "EchoOutput"), ShapeKind::Structure))
            .operation(
                forge_schema::OperationSchema::new(
                    ShapeId::new("com.example", "Echo"),
                    ShapeId::new("com.example", "EchoInput"),
                    ShapeId::new("com.example", "EchoOutput"),
                )
                .with_trait("http", serde_json::json!({"method": "GET", "path": "/echo/{id}", "code": 200})),
            )
            .build()
    }

    #[tokio::test]
    async fn invoke_resolves_a_bare_operation_name_against_the_default_namespace() {
        let registry = echo_registry();
        let codec = forge_schema::JsonCodec;
        let mock = Arc::new(MockTransport::new(registry.clone(), codec));
        mock.expect(MockMatcher::method_and_path("GET", "/echo/", |_req| {
            MockOutcome::Response(HttpResponseParts::new(200, vec![], b"{}".to_vec()))
        }));

        let client = Client::from_config(
            CallConfig::builder()
                .registry(registry)
                .default_namespace("com.example")
                .endpoint(Endpoint::new("https://example.com"))
                .with_transport(mock.clone() as Arc<dyn Transport>)
                .build()
                .unwrap(),
        );

        let input = Document::Map(std::collections::BTreeMap::from([("id".to_string(), Document::String("1".into()))]));
        let output = client.invoke("Echo", input, None).await.unwrap();
        assert_eq!(output, Document::Map(std::collections::BTreeMap::new()));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn invoke_rejects_an_unknown_operation_before_touching_the_transport() {
        let registry = echo_registry();
        let codec = forge_schema::JsonCodec;
        let mock = Arc::new(MockTransport::new(registry.clone(), codec));

        let client = Client::from_config(
            CallConfig::builder()
                .registry(registry)
                .default_namespace("com.example")
                .endpoint(Endpoint::new("https://example.com"))
                .with_transport(mock.clone() as Arc<dyn Transport>)
                .build()
                .unwrap(),
        );

        let result = client.invoke("NoSuchOperation", Document::Null, None).await;
        assert!(result.is_err());
        assert_eq!(mock.request_count(), 0);
    }
}
