mod api_key;
mod basic;
mod bearer;
mod sigv4;

pub use api_key::{ApiKeyLocation, ApiKeySigner};
pub use basic::BasicSigner;
pub use bearer::BearerSigner;
pub use sigv4::SigV4Signer;

use forge_core::Error;
use forge_http::HttpRequestParts;

use crate::identity::Identity;
use crate::properties::SignerProperties;

/// Applies an [`Identity`] to an outgoing request.
///
/// Signing itself never performs I/O — any network access an auth scheme
/// needs (fetching a session token, refreshing a bearer token) belongs in
/// the [`crate::identity::IdentityResolver`] that ran before `sign` was
/// called; by the time a `Signer` runs, its `Identity` is already in hand.
pub trait Signer: Send + Sync {
    fn sign(&self, request: &mut HttpRequestParts, identity: &Identity, properties: &SignerProperties) -> Result<(), Error>;
}

/// Replace any existing `Authorization` header with `value`.
pub(crate) fn set_authorization(request: &mut HttpRequestParts, value: String) {
    request.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
    request.headers.push(("Authorization".to_string(), value));
}

/// Leaves the request untouched, backing the `no-auth` sentinel scheme.
#[derive(Clone, Copy, Default)]
pub struct NoOpSigner;

impl Signer for NoOpSigner {
    fn sign(&self, _request: &mut HttpRequestParts, _identity: &Identity, _properties: &SignerProperties) -> Result<(), Error> {
        Ok(())
    }
}
