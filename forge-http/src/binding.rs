use forge_schema::{traits::well_known, Document, Member};

/// Where a single structure member is projected onto the wire, in the
/// priority order §4.2 specifies: `label > query > header > payload > body`
/// for inputs (outputs drop `label`/`query`, which never apply to a response).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Label,
    Query(String),
    Header(String),
    Payload,
    /// Bind the HTTP status code itself to this member (output-only).
    StatusCode,
    Body,
}

/// Classify a member for input binding. Exactly one binding applies.
pub fn classify_input(member: &Member) -> Binding {
    if member.traits.has(well_known::HTTP_LABEL) {
        return Binding::Label;
    }
    if let Some(key) = member.traits.get_str(well_known::HTTP_QUERY) {
        return Binding::Query(key.to_string());
    }
    if let Some(key) = member.traits.get_str(well_known::HTTP_HEADER) {
        return Binding::Header(key.to_string());
    }
    if member.traits.has(well_known::HTTP_PAYLOAD) {
        return Binding::Payload;
    }
    Binding::Body
}

/// Classify a member for output binding (no `label`/`query`).
pub fn classify_output(member: &Member) -> Binding {
    if member.traits.has("httpResponseCode") {
        return Binding::StatusCode;
    }
    if let Some(key) = member.traits.get_str(well_known::HTTP_HEADER) {
        return Binding::Header(key.to_string());
    }
    if member.traits.has(well_known::HTTP_PAYLOAD) {
        return Binding::Payload;
    }
    Binding::Body
}

/// Stringify a scalar `Document` the way a header or query or label value
/// is rendered on the wire: booleans as `true`/`false`, numbers in decimal
/// form, timestamps as HTTP date unless a `timestampFormat` member trait
/// says otherwise.
pub fn scalar_to_wire_string(value: &Document, member: &Member) -> Option<String> {
    match value {
        Document::String(s) => {
            if member.traits.has("timestamp") {
                Some(format_timestamp(s, member.traits.get_str("timestampFormat")))
            } else {
                Some(s.clone())
            }
        }
        Document::Bool(b) => Some(if *b { "true".to_string() } else { "false".to_string() }),
        Document::Number(n) => {
            if member.traits.has("timestamp") {
                Some(format_timestamp(&n.to_string(), member.traits.get_str("timestampFormat")))
            } else {
                Some(n.to_string())
            }
        }
        Document::Null => None,
        Document::List(_) | Document::Map(_) | Document::Blob(_) => None,
    }
}

/// `value` is either an RFC 3339 string or an epoch-seconds numeral string;
/// render per `format` (`"http-date"` default, `"date-time"`, `"epoch-seconds"`).
fn format_timestamp(value: &str, format: Option<&str>) -> String {
    let millis = value
        .parse::<f64>()
        .ok()
        .map(|secs| (secs * 1000.0) as i64)
        .or_else(|| forge_core::httpdate::parse_rfc3339_millis(value))
        .unwrap_or(0);

    match format {
        Some("epoch-seconds") => (millis / 1000).to_string(),
        Some("date-time") => {
            let secs = millis / 1000;
            chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| value.to_string())
        }
        _ => forge_core::httpdate::format_rfc1123(millis),
    }
}
