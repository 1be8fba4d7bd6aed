use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// RFC 3986 unreserved set plus `/`, the encoding set §4.2 "Query" mandates
/// for re-encoded query values.
const QUERY_UNRESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'|')
    .add(b'&')
    .add(b'=');

/// An ordered multimap of query key/value pairs, preserving insertion order
/// and repeated keys (§4.2: "repeated keys are appended").
#[derive(Default, Clone, Debug)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the query component of an existing URI, preserving whatever
    /// pairs were already present (e.g. on a call-scoped endpoint override).
    pub fn parse_existing(query: &str) -> Self {
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Remove every pair under `key`. Used by signers that overwrite
    /// rather than append (e.g. an API-key query parameter).
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as `key=value&key2=value2`, re-encoding every value with the
    /// unreserved-plus-`/` set regardless of how it arrived.
    pub fn render(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_UNRESERVED),
                    utf8_percent_encode(v, QUERY_UNRESERVED)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_existing_pairs_and_appends_repeated_keys() {
        let mut q = QueryParams::parse_existing("a=1");
        q.push("a", "2");
        assert_eq!(q.render(), "a=1&a=2");
    }

    #[test]
    fn re_encodes_values_with_unreserved_plus_slash() {
        let mut q = QueryParams::new();
        q.push("k", "a b/c");
        assert_eq!(q.render(), "k=a%20b/c");
    }
}
