use std::fmt;

/// Absolute identifier for a shape, `namespace#Name`.
///
/// Namespaces are dot-separated (`com.example.weather`). Identifiers are
/// compared and hashed by their full string form; there is no interning.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId {
    namespace: String,
    name: String,
}

impl ShapeId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse `namespace#Name`. Returns `None` if there is no `#` separator.
    pub fn parse(id: &str) -> Option<Self> {
        let (ns, name) = id.split_once('#')?;
        Some(Self::new(ns, name))
    }

    /// Resolve a possibly-relative shape reference against a service namespace.
    ///
    /// If `reference` already contains `#` it is parsed as absolute. Some
    /// wire-level error type strings also carry a URI suffix after `:`
    /// (e.g. `com.example#Foo:https://...`); that suffix is stripped first.
    pub fn resolve(reference: &str, default_namespace: &str) -> Self {
        let reference = reference.split(':').next().unwrap_or(reference);
        match Self::parse(reference) {
            Some(id) => id,
            None => Self::new(default_namespace, reference),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.name)
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_id() {
        let id = ShapeId::parse("com.example#Weather").unwrap();
        assert_eq!(id.namespace(), "com.example");
        assert_eq!(id.name(), "Weather");
    }

    #[test]
    fn resolves_relative_name_against_default_namespace() {
        let id = ShapeId::resolve("SomeError", "com.example");
        assert_eq!(id.to_string(), "com.example#SomeError");
    }

    #[test]
    fn resolve_strips_uri_suffix() {
        let id = ShapeId::resolve("com.example#Foo:https://internal/errors/foo", "com.example");
        assert_eq!(id.to_string(), "com.example#Foo");
    }

    #[test]
    fn resolve_prefers_absolute_when_present() {
        let id = ShapeId::resolve("other.ns#Foo", "com.example");
        assert_eq!(id.to_string(), "other.ns#Foo");
    }
}
