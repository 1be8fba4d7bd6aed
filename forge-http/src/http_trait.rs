use crate::path::{InvalidPattern, PathPattern};

/// The `http` trait on an operation shape: method, path pattern, and the
/// success status code to expect/emit.
#[derive(Clone, Debug)]
pub struct HttpTrait {
    pub method: String,
    pub pattern: PathPattern,
    pub code: u16,
}

/// Raised when an operation's raw `http` trait value can't be turned into an
/// [`HttpTrait`].
#[derive(Debug)]
pub enum HttpTraitError {
    Missing,
    InvalidPattern(InvalidPattern),
}

impl std::fmt::Display for HttpTraitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "operation has no `http` trait"),
            Self::InvalidPattern(e) => write!(f, "invalid `http` trait path: {e}"),
        }
    }
}

impl std::error::Error for HttpTraitError {}

impl From<InvalidPattern> for HttpTraitError {
    fn from(e: InvalidPattern) -> Self {
        Self::InvalidPattern(e)
    }
}

impl HttpTrait {
    pub fn new(method: impl Into<String>, path: &str) -> Result<Self, InvalidPattern> {
        Ok(Self {
            method: method.into(),
            pattern: PathPattern::parse(path)?,
            code: 200,
        })
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    /// Builds an `HttpTrait` from the raw JSON value stored under the `http`
    /// trait id, e.g. `{"method": "GET", "path": "/widgets/{id}", "code": 200}`.
    pub fn from_trait_value(value: &serde_json::Value) -> Result<Self, HttpTraitError> {
        let method = value
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("POST");
        let path = value.get("path").and_then(|v| v.as_str()).unwrap_or("/");
        let code = value
            .get("code")
            .and_then(|v| v.as_u64())
            .map(|c| c as u16)
            .unwrap_or(200);
        Ok(Self::new(method, path)?.with_code(code))
    }
}

/// How the error-response deserializer should locate the error shape id
/// before falling back to a body discriminator (§4.2 "Error response").
#[derive(Clone, Debug, Default)]
pub struct ErrorHeaderExtractor {
    pub header_name: Option<String>,
}

impl ErrorHeaderExtractor {
    pub fn named(header_name: impl Into<String>) -> Self {
        Self {
            header_name: Some(header_name.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_trait_value_reads_method_path_code() {
        let value = json!({"method": "GET", "path": "/widgets/{id}", "code": 200});
        let http_trait = HttpTrait::from_trait_value(&value).unwrap();
        assert_eq!(http_trait.method, "GET");
        assert_eq!(http_trait.code, 200);
    }

    #[test]
    fn from_trait_value_defaults_method_and_code() {
        let value = json!({"path": "/widgets"});
        let http_trait = HttpTrait::from_trait_value(&value).unwrap();
        assert_eq!(http_trait.method, "POST");
        assert_eq!(http_trait.code, 200);
    }

    #[test]
    fn from_trait_value_rejects_bad_pattern() {
        let value = json!({"method": "GET", "path": "/widgets/{a+}/{b+}"});
        assert!(HttpTrait::from_trait_value(&value).is_err());
    }
}
