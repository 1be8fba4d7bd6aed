/// Concatenate a service endpoint URI and a rendered request path the way
/// §4.2 "Endpoint merging" specifies: string concatenation of the two
/// percent-encoded halves, with no RFC 3986 dot-segment resolution applied.
///
/// `endpoint` may itself carry a base path (`https://h/base`); `request_path`
/// is always absolute (leading `/`). The merge never normalizes `.`/`..`
/// segments — callers that need that do it themselves before calling in.
pub fn merge(endpoint_uri: &str, request_path: &str) -> String {
    let trimmed = endpoint_uri.trim_end_matches('/');
    format!("{trimmed}{request_path}")
}

/// Strip a previously-merged endpoint prefix back off a merged URI, the
/// inverse of [`merge`]. Used by the idempotence property in §8.5: merging
/// twice, the second time with the prefix already stripped, must produce
/// the same result as merging once.
pub fn strip_prefix<'a>(endpoint_uri: &str, merged: &'a str) -> &'a str {
    let trimmed = endpoint_uri.trim_end_matches('/');
    merged.strip_prefix(trimmed).unwrap_or(merged)
}
