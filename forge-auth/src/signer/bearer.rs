use forge_core::Error;
use forge_http::HttpRequestParts;

use super::set_authorization;
use crate::identity::Identity;
use crate::properties::SignerProperties;
use crate::signer::Signer;

/// Sets `Authorization: Bearer <token>`, overwriting any existing
/// `Authorization` value (§4.3, scenario (e)).
#[derive(Clone, Copy, Default)]
pub struct BearerSigner;

impl Signer for BearerSigner {
    fn sign(&self, request: &mut HttpRequestParts, identity: &Identity, _properties: &SignerProperties) -> Result<(), Error> {
        let Identity::BearerToken(token) = identity else {
            return Err(Error::serialization("bearer signer requires a bearer-token identity"));
        };
        set_authorization(request, format!("Bearer {token}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_signing_overwrites_any_prior_authorization_values() {
        let mut request = HttpRequestParts {
            method: "GET".into(),
            uri: "https://example.com".into(),
            headers: vec![("Authorization".to_string(), "FOO, BAR".to_string())],
            body: vec![],
        };
        BearerSigner.sign(&mut request, &Identity::BearerToken("token".into()), &SignerProperties::empty()).unwrap();
        let values: Vec<_> = request
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(values, vec![&("Authorization".to_string(), "Bearer token".to_string())]);
    }
}
