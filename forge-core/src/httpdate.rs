//! Date parsing shared by SigV4 signing (`x-amz-date`), the retry
//! classifier's `retry-after` handling, and the HTTP binding engine's
//! timestamp header format.

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp (`2015-10-21T05:28:00Z`) into milliseconds
/// since the Unix epoch.
pub fn parse_rfc3339_millis(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

/// Parse an RFC 1123 HTTP date (`Wed, 21 Oct 2015 07:28:00 GMT`) into
/// milliseconds since the Unix epoch.
pub fn parse_rfc1123_millis(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc2822(&normalize_gmt(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

/// `chrono`'s RFC 2822 parser wants a numeric or named zone abbreviation it
/// recognizes; HTTP dates always say `GMT`, which parses as UTC directly,
/// so no rewrite is actually needed, but we keep this seam for zones like
/// `UT` that some servers still emit.
fn normalize_gmt(s: &str) -> std::borrow::Cow<'_, str> {
    if s.ends_with(" UT") {
        std::borrow::Cow::Owned(format!("{} GMT", &s[..s.len() - 3]))
    } else {
        std::borrow::Cow::Borrowed(s)
    }
}

/// Render milliseconds since the Unix epoch as an HTTP date
/// (`Wed, 21 Oct 2015 07:28:00 GMT`), the default timestamp format for
/// HTTP-bound headers.
pub fn format_rfc1123(millis: i64) -> String {
    epoch_or(millis).format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Render milliseconds since the Unix epoch as the compact SigV4 date
/// stamp (`YYYYMMDD`).
pub fn format_date_stamp(millis: i64) -> String {
    epoch_or(millis).format("%Y%m%d").to_string()
}

/// Render milliseconds since the Unix epoch as the SigV4 `x-amz-date`
/// value (`YYYYMMDDTHHMMSSZ`).
pub fn format_amz_date(millis: i64) -> String {
    epoch_or(millis).format("%Y%m%dT%H%M%SZ").to_string()
}

fn epoch_or(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is representable"))
}
