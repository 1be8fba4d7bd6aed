use std::sync::Arc;

use forge_auth::{AuthScheme, AuthSchemeCatalog, AuthSchemeResolver, DefaultAuthSchemeResolver};
use forge_core::{Context, Endpoint, EndpointResolver, Error, Plugin, PluginIdempotence, StaticEndpointResolver};
use forge_http::{ErrorHeaderExtractor, UnknownErrorFactory};
use forge_retry::{RetryStrategy, StandardRetryStrategy};
use forge_schema::{JsonCodec, PayloadCodec, SchemaRegistry};
use forge_transport::{ReqwestTransport, Transport, TransportRegistry, TransportRegistryBuilder};
use forge_utils::{Interceptor, InterceptorChain};

use crate::user_agent::UserAgentBuilder;

/// Everything a call needs to go from a schema-bound input to a
/// schema-bound output or error (§3 "Call configuration"): the service's
/// shapes, the protocol's codec and error-header convention, the transport
/// catalog, the endpoint resolver, the interceptor chain, the auth scheme
/// catalog and resolver, the retry strategy, and a base [`Context`].
///
/// Built once at client construction via [`CallConfigBuilder`] and cloned
/// cheaply for every call (every field is an `Arc`, a `SchemaRegistry`
/// `Clone`, or plain data); a per-call override produces a new snapshot
/// through [`CallConfig::to_builder`] rather than mutating the original.
#[derive(Clone)]
pub struct CallConfig {
    pub(crate) registry: SchemaRegistry,
    pub(crate) default_namespace: String,
    pub(crate) codec: Arc<dyn PayloadCodec>,
    pub(crate) error_header_extractor: ErrorHeaderExtractor,
    pub(crate) unknown_error_factory: Option<Arc<UnknownErrorFactory>>,
    pub(crate) transports: Arc<TransportRegistry>,
    pub(crate) endpoint_resolver: Arc<dyn EndpointResolver>,
    pub(crate) interceptors: Arc<InterceptorChain>,
    pub(crate) auth_catalog: Arc<AuthSchemeCatalog>,
    pub(crate) auth_scheme_resolver: Arc<dyn AuthSchemeResolver>,
    pub(crate) retry_strategy: Arc<dyn RetryStrategy>,
    pub(crate) retry_scope: Option<String>,
    pub(crate) user_agent: UserAgentBuilder,
    pub(crate) context: Context,
    plugin_idempotence: PluginIdempotence,
}

impl CallConfig {
    pub fn builder() -> CallConfigBuilder {
        CallConfigBuilder::new()
    }

    /// A builder pre-populated with this config's current values, the way
    /// a `toBuilder()` snapshot is meant to be used: free to add more
    /// plugins or interceptors without mutating `self`, but unable to
    /// silently reinstall a plugin `self` already carries.
    pub fn to_builder(&self) -> CallConfigBuilder {
        CallConfigBuilder {
            registry: Some(self.registry.clone()),
            default_namespace: Some(self.default_namespace.clone()),
            codec: Some(self.codec.clone()),
            error_header_extractor: self.error_header_extractor.clone(),
            unknown_error_factory: self.unknown_error_factory.clone(),
            transports: Some(
                self.transports
                    .entries()
                    .fold(TransportRegistry::builder(), |builder, (_, transport)| builder.with_transport(transport.clone())),
            ),
            endpoint_resolver: Some(self.endpoint_resolver.clone()),
            interceptors: self.interceptors.interceptors().to_vec(),
            auth_catalog: Some(
                self.auth_catalog
                    .schemes()
                    .fold(AuthSchemeCatalog::builder(), |builder, scheme| builder.with_scheme(scheme.clone())),
            ),
            auth_scheme_resolver: self.auth_scheme_resolver.clone(),
            retry_strategy: self.retry_strategy.clone(),
            retry_scope: self.retry_scope.clone(),
            user_agent: self.user_agent.clone(),
            context: self.context.clone(),
            plugin_idempotence: self.plugin_idempotence.clone(),
        }
    }

    /// Apply a one-off override, producing a new config without touching
    /// `self`. Panics only if `override_fn` leaves a required field unset,
    /// which [`to_builder`](Self::to_builder) never does on its own.
    pub fn with_override(&self, override_fn: CallOverride) -> CallConfig {
        (override_fn.0)(self.to_builder())
            .build()
            .expect("a call override must not remove a required CallConfig field")
    }
}

/// A one-shot transform applied to a [`CallConfigBuilder`] snapshot before
/// a single call, e.g. to swap the endpoint or add a per-call interceptor.
pub struct CallOverride(Box<dyn FnOnce(CallConfigBuilder) -> CallConfigBuilder + Send>);

impl CallOverride {
    pub fn new(f: impl FnOnce(CallConfigBuilder) -> CallConfigBuilder + Send + 'static) -> Self {
        Self(Box::new(f))
    }
}

pub struct CallConfigBuilder {
    registry: Option<SchemaRegistry>,
    default_namespace: Option<String>,
    codec: Option<Arc<dyn PayloadCodec>>,
    error_header_extractor: ErrorHeaderExtractor,
    unknown_error_factory: Option<Arc<UnknownErrorFactory>>,
    transports: Option<TransportRegistryBuilder>,
    endpoint_resolver: Option<Arc<dyn EndpointResolver>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    auth_catalog: Option<forge_auth::AuthSchemeCatalogBuilder>,
    auth_scheme_resolver: Arc<dyn AuthSchemeResolver>,
    retry_strategy: Arc<dyn RetryStrategy>,
    retry_scope: Option<String>,
    user_agent: UserAgentBuilder,
    context: Context,
    plugin_idempotence: PluginIdempotence,
}

impl Default for CallConfigBuilder {
    fn default() -> Self {
        Self {
            registry: None,
            default_namespace: None,
            codec: None,
            error_header_extractor: ErrorHeaderExtractor::default(),
            unknown_error_factory: None,
            transports: None,
            endpoint_resolver: None,
            interceptors: Vec::new(),
            auth_catalog: None,
            auth_scheme_resolver: Arc::new(DefaultAuthSchemeResolver),
            retry_strategy: Arc::new(StandardRetryStrategy::new(3)),
            retry_scope: None,
            user_agent: UserAgentBuilder::current(),
            context: Context::new(),
            plugin_idempotence: PluginIdempotence::new(),
        }
    }
}

impl CallConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    pub fn codec(mut self, codec: impl PayloadCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    pub fn error_header(mut self, header_name: impl Into<String>) -> Self {
        self.error_header_extractor = ErrorHeaderExtractor::named(header_name);
        self
    }

    /// Install a factory that replaces the default `Unmodeled` error
    /// produced when neither a header extractor nor a body discriminator
    /// resolves to a registered error shape (§4.2 "Error response", point 4).
    pub fn unknown_error_factory(
        mut self,
        factory: impl Fn(&forge_http::HttpResponseParts, &forge_schema::OperationSchema) -> Error + Send + Sync + 'static,
    ) -> Self {
        self.unknown_error_factory = Some(Arc::new(factory));
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        let builder = self.transports.take().unwrap_or_else(TransportRegistry::builder);
        self.transports = Some(builder.with_transport(transport));
        self
    }

    pub fn endpoint_resolver(mut self, resolver: Arc<dyn EndpointResolver>) -> Self {
        self.endpoint_resolver = Some(resolver);
        self
    }

    pub fn endpoint(self, endpoint: Endpoint) -> Self {
        self.endpoint_resolver(Arc::new(StaticEndpointResolver::new(endpoint)))
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn with_auth_scheme(mut self, scheme: Arc<dyn AuthScheme>) -> Self {
        let builder = self.auth_catalog.take().unwrap_or_else(AuthSchemeCatalog::builder);
        self.auth_catalog = Some(builder.with_scheme(scheme));
        self
    }

    pub fn auth_scheme_resolver(mut self, resolver: Arc<dyn AuthSchemeResolver>) -> Self {
        self.auth_scheme_resolver = resolver;
        self
    }

    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategy>) -> Self {
        self.retry_strategy = strategy;
        self
    }

    pub fn retry_scope(mut self, scope: impl Into<String>) -> Self {
        self.retry_scope = Some(scope.into());
        self
    }

    pub fn user_agent(mut self, user_agent: UserAgentBuilder) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.context = self.context.with_region(region);
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Install `plugin`, skipping it if a plugin of the same type was
    /// already applied to this builder (directly, or inherited from a
    /// [`CallConfig::to_builder`] snapshot).
    pub fn plugin<P: Plugin<Self> + 'static>(mut self, plugin: P) -> Self {
        if self.plugin_idempotence.mark::<P>() {
            self = Box::new(plugin).apply(self);
        }
        self
    }

    pub fn build(self) -> Result<CallConfig, Error> {
        let registry = self
            .registry
            .ok_or_else(|| Error::serialization("CallConfigBuilder: a schema registry is required"))?;
        let default_namespace = self
            .default_namespace
            .ok_or_else(|| Error::serialization("CallConfigBuilder: a default namespace is required"))?;
        let endpoint_resolver = self
            .endpoint_resolver
            .ok_or_else(|| Error::serialization("CallConfigBuilder: an endpoint resolver is required"))?;

        let codec: Arc<dyn PayloadCodec> = self.codec.unwrap_or_else(|| Arc::new(JsonCodec));
        let transports = match self.transports {
            Some(builder) => builder.build(),
            None => TransportRegistry::builder()
                .with_transport(Arc::new(ReqwestTransport::new()?))
                .build(),
        };
        let auth_catalog = self.auth_catalog.unwrap_or_else(AuthSchemeCatalog::builder).build();
        let interceptors: InterceptorChain = self.interceptors.into_iter().collect();

        Ok(CallConfig {
            registry,
            default_namespace,
            codec,
            error_header_extractor: self.error_header_extractor,
            unknown_error_factory: self.unknown_error_factory,
            transports: Arc::new(transports),
            endpoint_resolver,
            interceptors: Arc::new(interceptors),
            auth_catalog: Arc::new(auth_catalog),
            auth_scheme_resolver: self.auth_scheme_resolver,
            retry_strategy: self.retry_strategy,
            retry_scope: self.retry_scope,
            user_agent: self.user_agent,
            context: self.context,
            plugin_idempotence: self.plugin_idempotence,
        })
    }
}
