//! RFC 822 dates as used by `record/@last-modified`.
//!
//! Both functions are stateless; there is no shared formatter to guard.

use chrono::{DateTime, Utc};

/// Output pattern, always rendered in GMT.
pub const RFC822_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Formats a UTC timestamp as `Tue, 06 Nov 2007 12:45:26 GMT`.
pub fn format_rfc822(date: &DateTime<Utc>) -> String {
    date.format(RFC822_FORMAT).to_string()
}

/// Parses an RFC 822 date, accepting one- or two-digit days and any zone
/// offset chrono understands. Returns `None` when the text is not a date.
pub fn parse_rfc822(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(text.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
