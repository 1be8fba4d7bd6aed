/// A URI plus extra headers a transport must attach to every request sent
/// to it.
///
/// Created per call by an [`EndpointResolver`] and owned by the pipeline
/// for the duration of one attempt. A call-scoped [`Context::endpoint_override`]
/// completely replaces the resolver's URI; the resolver's extra headers are
/// still merged in (appended, never replaced) by the pipeline.
///
/// [`Context::endpoint_override`]: crate::Context::endpoint_override
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    uri: String,
    extra_headers: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            extra_headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn extra_headers(&self) -> &[(String, String)] {
        &self.extra_headers
    }
}

/// Resolves an endpoint for an operation given the current call context.
///
/// Implementations are typically a static URI (configured at client
/// construction) or a rule set keyed by region; both are reached through
/// this trait so the pipeline never special-cases either.
pub trait EndpointResolver: Send + Sync {
    fn resolve(&self, operation: &forge_schema::ShapeId, context: &crate::Context) -> Endpoint;
}

/// Resolver that always returns the same endpoint, ignoring the operation
/// and context. The common case for a single-region, single-host service
/// client.
pub struct StaticEndpointResolver {
    endpoint: Endpoint,
}

impl StaticEndpointResolver {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl EndpointResolver for StaticEndpointResolver {
    fn resolve(&self, _operation: &forge_schema::ShapeId, _context: &crate::Context) -> Endpoint {
        self.endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_schema::ShapeId;

    #[test]
    fn static_resolver_ignores_operation() {
        let resolver = StaticEndpointResolver::new(Endpoint::new("https://example.com"));
        let op = ShapeId::new("com.example", "GetWidget");
        let ctx = crate::Context::new();
        assert_eq!(resolver.resolve(&op, &ctx).uri(), "https://example.com");
    }
}
