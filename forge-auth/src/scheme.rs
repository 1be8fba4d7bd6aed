use std::collections::HashMap;
use std::sync::Arc;

use forge_core::Context;

use crate::identity::{AnonymousIdentityResolver, IdentityResolver};
use crate::properties::{IdentityProperties, PropertySet, SignerProperties};
use crate::signer::{NoOpSigner, Signer};

/// The sentinel scheme id that is always present in a catalog and always
/// resolves (§4.3 "Resolver": "a sentinel `no-auth` scheme exists and is
/// always present").
pub const NO_AUTH_SCHEME_ID: &str = "no-auth";

/// A stable identifier, a required identity type, and a signer (§4.3
/// "Scheme"). `signer_property_keys`/`identity_property_keys` name the
/// [`Context`] fields the scheme is willing to expose to its signer and
/// identity resolver, enforced by [`PropertySet::filtered`].
pub trait AuthScheme: Send + Sync {
    fn scheme_id(&self) -> &str;
    fn signer(&self) -> &dyn Signer;
    fn identity_resolver(&self) -> &dyn IdentityResolver;

    fn signer_property_keys(&self) -> &[&str] {
        &[]
    }

    fn identity_property_keys(&self) -> &[&str] {
        &[]
    }

    fn signer_properties(&self, context: &Context) -> SignerProperties {
        PropertySet::filtered(context, self.signer_property_keys())
    }

    fn identity_properties(&self, context: &Context) -> IdentityProperties {
        PropertySet::filtered(context, self.identity_property_keys())
    }
}

/// A scheme built from a fixed `(identity_resolver, signer)` pair and a
/// declared set of property keys — the shape every concrete scheme
/// (SigV4, bearer, API key, basic) takes.
pub struct SimpleAuthScheme {
    scheme_id: String,
    identity_resolver: Arc<dyn IdentityResolver>,
    signer: Arc<dyn Signer>,
    signer_property_keys: Vec<&'static str>,
    identity_property_keys: Vec<&'static str>,
}

impl SimpleAuthScheme {
    pub fn new(scheme_id: impl Into<String>, identity_resolver: Arc<dyn IdentityResolver>, signer: Arc<dyn Signer>) -> Self {
        Self {
            scheme_id: scheme_id.into(),
            identity_resolver,
            signer,
            signer_property_keys: Vec::new(),
            identity_property_keys: Vec::new(),
        }
    }

    pub fn with_signer_property_keys(mut self, keys: &[&'static str]) -> Self {
        self.signer_property_keys = keys.to_vec();
        self
    }

    pub fn with_identity_property_keys(mut self, keys: &[&'static str]) -> Self {
        self.identity_property_keys = keys.to_vec();
        self
    }
}

impl AuthScheme for SimpleAuthScheme {
    fn scheme_id(&self) -> &str {
        &self.scheme_id
    }

    fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    fn identity_resolver(&self) -> &dyn IdentityResolver {
        self.identity_resolver.as_ref()
    }

    fn signer_property_keys(&self) -> &[&str] {
        &self.signer_property_keys
    }

    fn identity_property_keys(&self) -> &[&str] {
        &self.identity_property_keys
    }
}

/// The `no-auth` sentinel: resolves to [`crate::identity::Identity::Anonymous`]
/// and signs nothing.
pub struct NoAuthScheme {
    identity_resolver: AnonymousIdentityResolver,
    signer: NoOpSigner,
}

impl Default for NoAuthScheme {
    fn default() -> Self {
        Self {
            identity_resolver: AnonymousIdentityResolver,
            signer: NoOpSigner,
        }
    }
}

impl AuthScheme for NoAuthScheme {
    fn scheme_id(&self) -> &str {
        NO_AUTH_SCHEME_ID
    }

    fn signer(&self) -> &dyn Signer {
        &self.signer
    }

    fn identity_resolver(&self) -> &dyn IdentityResolver {
        &self.identity_resolver
    }
}

/// Immutable-after-construction registry of schemes a client supports,
/// keyed by scheme id (§6 "Shared resources": "the auth scheme catalog ...
/// are immutable after construction"). The `no-auth` sentinel is always
/// present, even if the caller never registers one.
pub struct AuthSchemeCatalog {
    schemes: HashMap<String, Arc<dyn AuthScheme>>,
}

impl AuthSchemeCatalog {
    pub fn builder() -> AuthSchemeCatalogBuilder {
        AuthSchemeCatalogBuilder::default()
    }

    pub fn get(&self, scheme_id: &str) -> Option<&Arc<dyn AuthScheme>> {
        self.schemes.get(scheme_id)
    }

    pub fn contains(&self, scheme_id: &str) -> bool {
        self.schemes.contains_key(scheme_id)
    }

    /// Every registered scheme, for a caller that needs to seed a new
    /// builder from an already-built catalog (e.g. a per-call override
    /// snapshot).
    pub fn schemes(&self) -> impl Iterator<Item = &Arc<dyn AuthScheme>> {
        self.schemes.values()
    }
}

#[derive(Default)]
pub struct AuthSchemeCatalogBuilder {
    schemes: HashMap<String, Arc<dyn AuthScheme>>,
}

impl AuthSchemeCatalogBuilder {
    pub fn with_scheme(mut self, scheme: Arc<dyn AuthScheme>) -> Self {
        self.schemes.insert(scheme.scheme_id().to_string(), scheme);
        self
    }

    pub fn build(mut self) -> AuthSchemeCatalog {
        self.schemes
            .entry(NO_AUTH_SCHEME_ID.to_string())
            .or_insert_with(|| Arc::new(NoAuthScheme::default()));
        AuthSchemeCatalog { schemes: self.schemes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::BearerTokenResolver;
    use crate::signer::BearerSigner;

    #[test]
    fn catalog_always_contains_the_no_auth_sentinel() {
        let catalog = AuthSchemeCatalog::builder().build();
        assert!(catalog.contains(NO_AUTH_SCHEME_ID));
    }

    #[test]
    fn registered_schemes_are_retrievable_by_id() {
        let scheme = SimpleAuthScheme::new("bearer", Arc::new(BearerTokenResolver::new("t")), Arc::new(BearerSigner));
        let catalog = AuthSchemeCatalog::builder().with_scheme(Arc::new(scheme)).build();
        assert!(catalog.contains("bearer"));
        assert_eq!(catalog.get("bearer").unwrap().scheme_id(), "bearer");
    }

    #[test]
    fn schemes_lists_every_registered_scheme_including_no_auth() {
        let scheme = SimpleAuthScheme::new("bearer", Arc::new(BearerTokenResolver::new("t")), Arc::new(BearerSigner));
        let catalog = AuthSchemeCatalog::builder().with_scheme(Arc::new(scheme)).build();
        assert_eq!(catalog.schemes().count(), 2);
    }

    #[test]
    fn filtered_property_views_respect_declared_keys() {
        let scheme = SimpleAuthScheme::new("sigv4", Arc::new(BearerTokenResolver::new("t")), Arc::new(BearerSigner))
            .with_signer_property_keys(&["region"]);
        let context = Context::new().with_region("us-west-2");
        let properties = scheme.signer_properties(&context);
        assert_eq!(properties.get_str("region"), Some("us-west-2"));
    }
}
