use std::collections::HashMap;

use forge_core::Context;

/// A scalar value carried by [`SignerProperties`]/[`IdentityProperties`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    U64(u64),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PropertyValue::U64(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// Well-known [`Context`] fields a scheme may ask to see. This is the
/// closed set `filtered` projects from; a scheme cannot reach into the
/// context for anything not named here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ContextKey {
    Region,
    RetryScope,
    IdempotencyToken,
}

const ALL_CONTEXT_KEYS: &[(&str, ContextKey)] = &[
    ("region", ContextKey::Region),
    ("retry_scope", ContextKey::RetryScope),
    ("idempotency_token", ContextKey::IdempotencyToken),
];

fn read_context_key(context: &Context, key: ContextKey) -> Option<PropertyValue> {
    match key {
        ContextKey::Region => context.region().map(PropertyValue::from),
        ContextKey::RetryScope => context.retry_scope().map(PropertyValue::from),
        ContextKey::IdempotencyToken => context.idempotency_token().map(PropertyValue::from),
    }
}

/// A read-only, scheme-scoped view over [`Context`].
///
/// §9's open question about the "filtered" auth context is resolved here as
/// a privacy boundary: an [`AuthScheme`](crate::scheme::AuthScheme) declares
/// the named keys it needs (`signer_property_keys`/`identity_property_keys`),
/// and only those keys are copied out of the call's `Context` into the
/// property set handed to its signer/identity resolver. A scheme can never
/// observe a context field it didn't declare, and extra scheme-local values
/// (e.g. a region override supplied directly to the scheme) can still be
/// layered in via [`SignerProperties::insert`]/[`IdentityProperties::insert`].
#[derive(Clone, Debug, Default)]
pub struct PropertySet(HashMap<String, PropertyValue>);

impl PropertySet {
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Build a view containing only `keys`, read out of `context`.
    pub fn filtered(context: &Context, keys: &[&str]) -> Self {
        let mut values = HashMap::new();
        for (name, key) in ALL_CONTEXT_KEYS {
            if keys.contains(name) {
                if let Some(value) = read_context_key(context, *key) {
                    values.insert((*name).to_string(), value);
                }
            }
        }
        Self(values)
    }

    pub fn insert(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }
}

/// Properties handed to a [`crate::signer::Signer`].
pub type SignerProperties = PropertySet;
/// Properties handed to an [`crate::identity::IdentityResolver`].
pub type IdentityProperties = PropertySet;
