//! Auth scheme resolution, identity resolvers, and request signers (§4.3).
//!
//! A [`scheme::AuthScheme`] pairs an [`identity::IdentityResolver`] with a
//! [`signer::Signer`] under a stable id; an [`scheme::AuthSchemeCatalog`]
//! holds every scheme a client supports (always including the `no-auth`
//! sentinel), and [`resolver::select_auth_scheme`] picks the first one an
//! operation accepts whose identity actually resolves.

pub mod cache;
pub mod identity;
pub mod properties;
pub mod recursion;
pub mod resolver;
pub mod scheme;
pub mod signer;

pub use cache::CachingIdentityResolver;
pub use identity::{
    AnonymousIdentityResolver, ApiKeyResolver, BearerTokenResolver, Identity, IdentityResolver,
    LoginResolver, ProfileFileCredentialsResolver, StaticCredentialsResolver,
};
pub use properties::{ContextKey, IdentityProperties, PropertySet, PropertyValue, SignerProperties};
pub use recursion::RecursionDetectionGuard;
pub use resolver::{
    AuthSchemeResolver, AuthSchemeResolverParams, DefaultAuthSchemeResolver, SelectedAuthScheme,
    select_auth_scheme,
};
pub use scheme::{AuthScheme, AuthSchemeCatalog, AuthSchemeCatalogBuilder, NoAuthScheme, SimpleAuthScheme, NO_AUTH_SCHEME_ID};
pub use signer::{ApiKeyLocation, ApiKeySigner, BasicSigner, BearerSigner, NoOpSigner, SigV4Signer, Signer};
