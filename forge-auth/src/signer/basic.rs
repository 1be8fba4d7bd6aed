use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use forge_core::Error;
use forge_http::HttpRequestParts;

use super::set_authorization;
use crate::identity::Identity;
use crate::properties::SignerProperties;
use crate::signer::Signer;

/// Sets `Authorization: Basic <b64(user:pass)>`, overwriting any existing
/// `Authorization` value.
#[derive(Clone, Copy, Default)]
pub struct BasicSigner;

impl Signer for BasicSigner {
    fn sign(&self, request: &mut HttpRequestParts, identity: &Identity, _properties: &SignerProperties) -> Result<(), Error> {
        let Identity::Login { username, password } = identity else {
            return Err(Error::serialization("basic signer requires a login identity"));
        };
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        set_authorization(request, format!("Basic {encoded}"));
        Ok(())
    }
}
