//! Utility functions shared by the feed builder.
//!
//! - **Text**: duration formatting, HTML escaping, CDATA guarding
//! - **Dates**: ISO-8601 parsing and RFC 822 rendering for RSS
//!
//! # Examples
//!
//! ```
//! use trackfeed::util::{format_duration, pub_date};
//!
//! assert_eq!(format_duration(Some(245)), "4:05");
//! assert_eq!(pub_date("2024-01-01T00:00:00Z"), "Mon, 01 Jan 2024 00:00:00 +0000");
//! ```

mod dates;
mod text;

pub use dates::{parse_iso8601, pub_date, to_rfc822};
pub use text::{cdata_safe, escape_html, format_duration};
