use std::collections::HashSet;

/// Builds the `user-agent` header value (§6): `smithy-<core>/<version>
/// lang/<runtime>#<runtime-version> [app/<sanitized-id>] [m/<feature-csv>]`.
///
/// One instance is built at client construction and reused for every call,
/// since only the feature set (read from [`forge_core::Context::features`]
/// at call time) varies per call.
#[derive(Clone, Debug)]
pub struct UserAgentBuilder {
    core_version: String,
    runtime_version: String,
    application_id: Option<String>,
}

impl UserAgentBuilder {
    pub fn new(core_version: impl Into<String>, runtime_version: impl Into<String>) -> Self {
        Self {
            core_version: core_version.into(),
            runtime_version: runtime_version.into(),
            application_id: None,
        }
    }

    /// Built from this crate's own version, for the common case of a
    /// client that doesn't need to report a different component version.
    pub fn current() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"), "unknown")
    }

    pub fn with_runtime_version(mut self, version: impl Into<String>) -> Self {
        self.runtime_version = version.into();
        self
    }

    /// `app/<id>` is meant for a human-chosen application identifier;
    /// whitespace is replaced with `_` since the header is space-delimited.
    pub fn with_application_id(mut self, id: impl Into<String>) -> Self {
        self.application_id = Some(sanitize(id.into()));
        self
    }

    pub fn build(&self, features: &HashSet<String>) -> String {
        let mut value = format!("smithy-forge/{} lang/rust#{}", self.core_version, self.runtime_version);
        if let Some(app) = &self.application_id {
            value.push_str(" app/");
            value.push_str(app);
        }
        if !features.is_empty() {
            let mut sorted: Vec<&str> = features.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            value.push_str(" m/");
            value.push_str(&sorted.join(","));
        }
        value
    }
}

fn sanitize(id: String) -> String {
    id.chars().map(|c| if c.is_whitespace() { '_' } else { c }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_base_format_with_no_extras() {
        let ua = UserAgentBuilder::new("1.2.3", "1.79.0");
        assert_eq!(ua.build(&HashSet::new()), "smithy-forge/1.2.3 lang/rust#1.79.0");
    }

    #[test]
    fn appends_application_id_and_sanitizes_whitespace() {
        let ua = UserAgentBuilder::new("1.2.3", "1.79.0").with_application_id("my app");
        assert_eq!(ua.build(&HashSet::new()), "smithy-forge/1.2.3 lang/rust#1.79.0 app/my_app");
    }

    #[test]
    fn appends_sorted_feature_csv() {
        let ua = UserAgentBuilder::new("1.2.3", "1.79.0");
        let mut features = HashSet::new();
        features.insert("retry-mode/standard".to_string());
        features.insert("account-id-mode/strict".to_string());
        assert_eq!(
            ua.build(&features),
            "smithy-forge/1.2.3 lang/rust#1.79.0 m/account-id-mode/strict,retry-mode/standard"
        );
    }
}
