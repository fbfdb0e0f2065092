//! Converts a paginated music-catalog API into an RSS 2.0 feed.
//!
//! [`catalog::fetch_tracks`] walks the API into a de-duplicated list of
//! tracks; [`feed::write_feed`] renders that list as a feed document.

pub mod catalog;
pub mod config;
pub mod feed;
pub mod util;
