use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// RFC 822 date layout required by RSS 2.0, always rendered in UTC.
const RFC822_UTC: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// Parses an ISO-8601 style timestamp.
///
/// Accepted forms:
/// - RFC 3339 with `Z` or a numeric offset (`2024-01-01T10:00:00+02:00`)
/// - Naive date-time, taken as UTC (`2024-01-01T10:00:00`, `2024-01-01 10:00:00.5`)
/// - Bare date, taken as UTC midnight (`2024-01-01`)
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp as an RSS date: `Mon, 01 Jan 2024 00:00:00 +0000`.
pub fn to_rfc822(dt: &DateTime<Utc>) -> String {
    dt.format(RFC822_UTC).to_string()
}

/// Converts a catalog `created_at` into an RSS `pubDate` value.
///
/// Unparseable input is passed through unchanged.
pub fn pub_date(raw: &str) -> String {
    match parse_iso8601(raw) {
        Some(dt) => to_rfc822(&dt),
        None => {
            tracing::debug!(raw = %raw, "Unparseable created_at, using raw value");
            raw.to_string()
        }
    }
}
