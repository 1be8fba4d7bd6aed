use std::collections::HashMap;

use serde_json::Value;

/// A named, JSON-valued attribute attached to a shape or member.
///
/// Traits are addressed by a stable string identifier (`"http"`,
/// `"httpLabel"`, `"required"`, ...), never by a Rust type, so that new
/// traits can be registered without changing this crate.
#[derive(Default, Clone, Debug)]
pub struct TraitMap(HashMap<String, Value>);

impl TraitMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, value: Value) -> Self {
        self.0.insert(id.into(), value);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.0.get(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn get_str(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(Value::as_str)
    }
}

/// Well-known trait identifiers used by the HTTP binding engine and the
/// retry classifier. Not exhaustive; any string may be used as a trait id.
pub mod well_known {
    pub const HTTP: &str = "http";
    pub const HTTP_LABEL: &str = "httpLabel";
    pub const HTTP_QUERY: &str = "httpQuery";
    pub const HTTP_HEADER: &str = "httpHeader";
    pub const HTTP_PAYLOAD: &str = "httpPayload";
    pub const HTTP_ERROR: &str = "httpError";
    pub const REQUIRED: &str = "required";
    pub const ERROR: &str = "error";
    pub const RETRYABLE: &str = "retryable";
    pub const THROTTLING: &str = "throttling";
    pub const IDEMPOTENT: &str = "idempotent";
    pub const READONLY: &str = "readonly";
    pub const JSON_NAME: &str = "jsonName";
    pub const STREAMING: &str = "streaming";
    pub const MEDIA_TYPE: &str = "mediaType";
}
