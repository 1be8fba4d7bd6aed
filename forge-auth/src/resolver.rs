use std::sync::Arc;

use forge_core::{Context, Error};

use crate::identity::Identity;
use crate::scheme::{AuthScheme, AuthSchemeCatalog, NO_AUTH_SCHEME_ID};

/// Inputs available to an [`AuthSchemeResolver`]; `operation_auth_schemes`
/// is the operation's own priority-ordered list (§2 "Operation").
pub struct AuthSchemeResolverParams<'a> {
    pub operation_auth_schemes: &'a [String],
}

impl<'a> AuthSchemeResolverParams<'a> {
    pub fn new(operation_auth_schemes: &'a [String]) -> Self {
        Self { operation_auth_schemes }
    }
}

/// Produces an ordered list of scheme options to try (§4.3 "Resolver").
pub trait AuthSchemeResolver: Send + Sync {
    fn resolve_auth_scheme(&self, params: &AuthSchemeResolverParams<'_>) -> Vec<String>;
}

/// Tries the operation's own scheme list in order, with the `no-auth`
/// sentinel appended if the operation didn't already name it.
#[derive(Clone, Copy, Default)]
pub struct DefaultAuthSchemeResolver;

impl AuthSchemeResolver for DefaultAuthSchemeResolver {
    fn resolve_auth_scheme(&self, params: &AuthSchemeResolverParams<'_>) -> Vec<String> {
        let mut ordered = params.operation_auth_schemes.to_vec();
        if !ordered.iter().any(|id| id == NO_AUTH_SCHEME_ID) {
            ordered.push(NO_AUTH_SCHEME_ID.to_string());
        }
        ordered
    }
}

/// The scheme and identity an attempt will sign with.
pub struct SelectedAuthScheme {
    pub scheme: Arc<dyn AuthScheme>,
    pub identity: Identity,
}

/// Walk `resolver`'s ordered scheme ids; the first one present in
/// `catalog` whose identity resolver succeeds wins (§4.3: "The first
/// option whose identity can be resolved and whose scheme is present in
/// the client's `supported_auth_schemes` wins"). Since the `no-auth`
/// sentinel is always in the catalog and always resolves, this only
/// returns `Err` if every non-sentinel scheme fails and the sentinel was
/// somehow excluded from `catalog`.
pub async fn select_auth_scheme(
    resolver: &dyn AuthSchemeResolver,
    catalog: &AuthSchemeCatalog,
    params: &AuthSchemeResolverParams<'_>,
    context: &Context,
) -> Result<SelectedAuthScheme, Error> {
    let mut last_err = None;
    for scheme_id in resolver.resolve_auth_scheme(params) {
        let Some(scheme) = catalog.get(&scheme_id) else {
            continue;
        };
        let identity_properties = scheme.identity_properties(context);
        match scheme.identity_resolver().resolve(&identity_properties).await {
            Ok(identity) => {
                return Ok(SelectedAuthScheme {
                    scheme: scheme.clone(),
                    identity,
                })
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| Error::serialization("no auth scheme in the catalog could be resolved")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{BearerTokenResolver, ProfileFileCredentialsResolver};
    use crate::scheme::SimpleAuthScheme;
    use crate::signer::BearerSigner;

    #[tokio::test]
    async fn first_resolvable_scheme_in_priority_order_wins() {
        let bearer = SimpleAuthScheme::new("bearer", Arc::new(BearerTokenResolver::new("t")), Arc::new(BearerSigner));
        let catalog = AuthSchemeCatalog::builder().with_scheme(Arc::new(bearer)).build();
        let params = AuthSchemeResolverParams::new(&[]);
        let selected = select_auth_scheme(&DefaultAuthSchemeResolver, &catalog, &params, &Context::new())
            .await
            .unwrap();
        assert_eq!(selected.scheme.scheme_id(), "bearer");
    }

    #[tokio::test]
    async fn falls_through_to_the_next_scheme_when_identity_resolution_fails() {
        use crate::signer::BasicSigner;

        let broken = SimpleAuthScheme::new(
            "profile",
            Arc::new(ProfileFileCredentialsResolver::new("missing")),
            Arc::new(BasicSigner),
        );
        let bearer = SimpleAuthScheme::new("bearer", Arc::new(BearerTokenResolver::new("t")), Arc::new(BearerSigner));
        let catalog = AuthSchemeCatalog::builder()
            .with_scheme(Arc::new(broken))
            .with_scheme(Arc::new(bearer))
            .build();
        let operation_schemes = vec!["profile".to_string(), "bearer".to_string()];
        let params = AuthSchemeResolverParams::new(&operation_schemes);
        let selected = select_auth_scheme(&DefaultAuthSchemeResolver, &catalog, &params, &Context::new())
            .await
            .unwrap();
        assert_eq!(selected.scheme.scheme_id(), "bearer");
    }

    #[tokio::test]
    async fn falls_through_to_the_no_auth_sentinel_when_nothing_else_resolves() {
        let catalog = AuthSchemeCatalog::builder().build();
        let params = AuthSchemeResolverParams::new(&[]);
        let selected = select_auth_scheme(&DefaultAuthSchemeResolver, &catalog, &params, &Context::new())
            .await
            .unwrap();
        assert_eq!(selected.scheme.scheme_id(), crate::scheme::NO_AUTH_SCHEME_ID);
        assert!(matches!(selected.identity, Identity::Anonymous));
    }
}
