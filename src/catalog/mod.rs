//! Catalog access: paginated fetching of track records from the music API.
//!
//! - [`track`] - Lenient extraction of [`TrackRecord`]s from raw JSON
//! - [`fetcher`] - The page loop with de-duplication and early termination
//!
//! # Example
//!
//! ```ignore
//! use trackfeed::catalog::{fetch_tracks, FetchOptions};
//!
//! let outcome = fetch_tracks(&client, &options).await;
//! if let Some(e) = outcome.error() {
//!     // Partial results are still in outcome.tracks
//! }
//! ```

mod fetcher;
mod track;

pub use fetcher::{
    fetch_tracks, FetchError, FetchOptions, FetchOutcome, StopReason, MAX_PAGE_BYTES,
};
pub use track::{Credit, TrackId, TrackRecord};
