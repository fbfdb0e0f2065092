use std::borrow::Cow;

/// Formats a track length as `minutes:seconds`.
///
/// Seconds are zero-padded to two digits; minutes are not padded and never
/// roll over into hours. Zero or absent durations render as an empty string.
///
/// # Examples
///
/// ```
/// use trackfeed::util::format_duration;
///
/// assert_eq!(format_duration(Some(65)), "1:05");
/// assert_eq!(format_duration(Some(3661)), "61:01");
/// assert_eq!(format_duration(Some(0)), "");
/// assert_eq!(format_duration(None), "");
/// ```
pub fn format_duration(seconds: Option<u64>) -> String {
    match seconds {
        None | Some(0) => String::new(),
        Some(total) => format!("{}:{:02}", total / 60, total % 60),
    }
}

/// Escapes text for interpolation into an HTML fragment.
///
/// Covers `&`, `<`, `>`, `"` and `'`, so the result is safe both as element
/// content and inside a quoted attribute.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Wraps text in a CDATA-safe form.
///
/// A literal `]]>` would close the section early, so it is split across two
/// adjacent sections. Consumers concatenate them back transparently.
pub fn cdata_safe(s: &str) -> Cow<'_, str> {
    if s.contains("]]>") {
        Cow::Owned(s.replace("]]>", "]]]]><![CDATA[>"))
    } else {
        Cow::Borrowed(s)
    }
}
