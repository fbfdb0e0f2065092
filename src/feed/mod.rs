//! RSS 2.0 generation from catalog track records.
//!
//! - [`urls`] - Canonical track links, guids and artwork URLs
//! - [`item`] - Per-track field derivation ([`FeedItem`])
//! - [`rss`] - Document serialization with `quick-xml` and atomic file output
//!
//! # Example
//!
//! ```ignore
//! use trackfeed::feed::{write_feed, Channel, SiteUrls};
//!
//! let channel = Channel { title, description, feed_url, urls: SiteUrls::new(site, assets) };
//! write_feed(&outcome.tracks, &channel, Path::new("tracks_feed.xml"))?;
//! ```

mod item;
mod rss;
mod urls;

pub use item::{FeedItem, UNTITLED};
pub use rss::{build_feed, render_feed, write_feed, Channel};
pub use urls::SiteUrls;
