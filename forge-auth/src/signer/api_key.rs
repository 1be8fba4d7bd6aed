use forge_core::Error;
use forge_http::{HttpRequestParts, QueryParams};

use crate::identity::Identity;
use crate::properties::SignerProperties;
use crate::signer::Signer;

/// Where an [`ApiKeySigner`] writes the key.
#[derive(Clone, Debug)]
pub enum ApiKeyLocation {
    Header(String),
    Query(String),
}

/// Writes an API key to either a named header or a query parameter,
/// overwriting any existing value under the same name (§4.3 "API key
/// signer").
#[derive(Clone, Debug)]
pub struct ApiKeySigner {
    location: ApiKeyLocation,
    scheme_prefix: Option<String>,
}

impl ApiKeySigner {
    pub fn header(name: impl Into<String>) -> Self {
        Self {
            location: ApiKeyLocation::Header(name.into()),
            scheme_prefix: None,
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self {
            location: ApiKeyLocation::Query(name.into()),
            scheme_prefix: None,
        }
    }

    /// Prefix the key value with a scheme token, e.g. `SCHEME my-api-key`.
    pub fn with_scheme_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.scheme_prefix = Some(prefix.into());
        self
    }
}

impl Signer for ApiKeySigner {
    fn sign(&self, request: &mut HttpRequestParts, identity: &Identity, _properties: &SignerProperties) -> Result<(), Error> {
        let Identity::ApiKey(key) = identity else {
            return Err(Error::serialization("api-key signer requires an api-key identity"));
        };
        let value = match &self.scheme_prefix {
            Some(prefix) => format!("{prefix} {key}"),
            None => key.clone(),
        };

        match &self.location {
            ApiKeyLocation::Header(name) => {
                request.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
                request.headers.push((name.clone(), value));
            }
            ApiKeyLocation::Query(name) => {
                let (base, existing_query) = match request.uri.split_once('?') {
                    Some((base, query)) => (base.to_string(), query.to_string()),
                    None => (request.uri.clone(), String::new()),
                };
                let mut query = QueryParams::parse_existing(&existing_query);
                query.remove(name);
                query.push(name.clone(), value);
                request.uri = format!("{base}?{}", query.render());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> HttpRequestParts {
        HttpRequestParts {
            method: "PUT".into(),
            uri: uri.into(),
            headers: vec![],
            body: vec![],
        }
    }

    #[test]
    fn header_signing_sets_the_named_header() {
        let mut req = request("https://www.example.com");
        ApiKeySigner::header("x-api-key")
            .sign(&mut req, &Identity::ApiKey("my-api-key".into()), &SignerProperties::empty())
            .unwrap();
        assert_eq!(req.headers, vec![("x-api-key".to_string(), "my-api-key".to_string())]);
        assert_eq!(req.uri, "https://www.example.com");
    }

    #[test]
    fn scheme_prefix_is_prepended_to_the_header_value() {
        let mut req = request("https://www.example.com");
        ApiKeySigner::header("x-api-key")
            .with_scheme_prefix("SCHEME")
            .sign(&mut req, &Identity::ApiKey("my-api-key".into()), &SignerProperties::empty())
            .unwrap();
        assert_eq!(req.headers, vec![("x-api-key".to_string(), "SCHEME my-api-key".to_string())]);
    }

    #[test]
    fn query_signing_overwrites_an_existing_value_under_the_same_key() {
        let mut req = request("https://www.example.com?api_key=stale&other=1");
        ApiKeySigner::query("api_key")
            .sign(&mut req, &Identity::ApiKey("fresh".into()), &SignerProperties::empty())
            .unwrap();
        assert_eq!(req.uri, "https://www.example.com?other=1&api_key=fresh");
    }
}
