use std::collections::HashMap;

use async_trait::async_trait;
use forge_core::Error;

use crate::properties::IdentityProperties;

/// The resolved credential material a [`crate::signer::Signer`] applies to
/// a request.
///
/// Variants mirror §4.3 "Identity resolver": AWS-style static credentials
/// (used by the SigV4 signer), a bearer token, a named API key, and a
/// username/password login pair (used by the basic signer).
#[derive(Clone, Debug)]
pub enum Identity {
    AwsCredentials {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    },
    BearerToken(String),
    ApiKey(String),
    Login {
        username: String,
        password: String,
    },
    /// The identity resolved by the `no-auth` sentinel scheme.
    Anonymous,
}

impl Identity {
    pub fn static_credentials(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Identity::AwsCredentials {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        if let Identity::AwsCredentials { session_token, .. } = &mut self {
            *session_token = Some(token.into());
        }
        self
    }
}

/// Resolves an [`Identity`] given the properties a scheme publishes for it.
///
/// Implementations are free to perform network I/O (profile-file reads,
/// JWKS-backed bearer validation); the pipeline calls resolvers in order
/// and falls through to the next one on failure (§4.3).
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, properties: &IdentityProperties) -> Result<Identity, Error>;
}

/// Resolves to a fixed, pre-supplied set of AWS-style credentials.
///
/// The common case for a client constructed with long-lived static keys.
pub struct StaticCredentialsResolver {
    identity: Identity,
}

impl StaticCredentialsResolver {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            identity: Identity::static_credentials(access_key_id, secret_access_key),
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.identity = self.identity.with_session_token(token);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticCredentialsResolver {
    async fn resolve(&self, _properties: &IdentityProperties) -> Result<Identity, Error> {
        Ok(self.identity.clone())
    }
}

/// Reads AWS-style credentials out of an in-memory profile map, the way a
/// parsed `~/.aws/credentials`-style file would be represented once
/// loaded. Profile loading itself is out of scope (§1); this resolver only
/// owns the already-parsed lookup.
pub struct ProfileFileCredentialsResolver {
    profiles: HashMap<String, Identity>,
    active_profile: String,
}

impl ProfileFileCredentialsResolver {
    pub fn new(active_profile: impl Into<String>) -> Self {
        Self {
            profiles: HashMap::new(),
            active_profile: active_profile.into(),
        }
    }

    pub fn with_profile(
        mut self,
        name: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.profiles
            .insert(name.into(), Identity::static_credentials(access_key_id, secret_access_key));
        self
    }
}

#[async_trait]
impl IdentityResolver for ProfileFileCredentialsResolver {
    async fn resolve(&self, _properties: &IdentityProperties) -> Result<Identity, Error> {
        self.profiles
            .get(&self.active_profile)
            .cloned()
            .ok_or_else(|| Error::serialization(format!("no such profile: {}", self.active_profile)))
    }
}

/// Resolves to a fixed bearer token.
pub struct BearerTokenResolver {
    token: String,
}

impl BearerTokenResolver {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl IdentityResolver for BearerTokenResolver {
    async fn resolve(&self, _properties: &IdentityProperties) -> Result<Identity, Error> {
        Ok(Identity::BearerToken(self.token.clone()))
    }
}

/// Resolves to a fixed API key.
pub struct ApiKeyResolver {
    key: String,
}

impl ApiKeyResolver {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl IdentityResolver for ApiKeyResolver {
    async fn resolve(&self, _properties: &IdentityProperties) -> Result<Identity, Error> {
        Ok(Identity::ApiKey(self.key.clone()))
    }
}

/// Resolves to a fixed username/password pair, for the basic-auth signer.
pub struct LoginResolver {
    username: String,
    password: String,
}

impl LoginResolver {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl IdentityResolver for LoginResolver {
    async fn resolve(&self, _properties: &IdentityProperties) -> Result<Identity, Error> {
        Ok(Identity::Login {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

/// Always resolves to [`Identity::Anonymous`], backing the `no-auth`
/// sentinel scheme.
#[derive(Clone, Copy, Default)]
pub struct AnonymousIdentityResolver;

#[async_trait]
impl IdentityResolver for AnonymousIdentityResolver {
    async fn resolve(&self, _properties: &IdentityProperties) -> Result<Identity, Error> {
        Ok(Identity::Anonymous)
    }
}
