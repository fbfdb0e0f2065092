use crate::catalog::track::{TrackId, TrackRecord};
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default cap on a single page body.
pub const MAX_PAGE_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Errors that end pagination early.
///
/// None of these reach the caller as an `Err`: they are recorded in
/// [`StopReason::Failed`] and the tracks gathered so far are still returned.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Body was not a JSON object
    #[error("Decode error: {0}")]
    Decode(String),
    /// Response body exceeded [`FetchOptions::max_page_bytes`]
    #[error("Response too large")]
    ResponseTooLarge,
    /// The endpoint in the config could not be parsed as a URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Why pagination stopped.
#[derive(Debug)]
pub enum StopReason {
    /// `max_pages` was reached.
    PageLimit,
    /// A page came back with no tracks.
    EmptyPage,
    /// A page came back with fewer records than requested.
    ShortPage,
    /// A request or decode failed; earlier pages are kept.
    Failed(FetchError),
}

/// Pagination settings for [`fetch_tracks`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub endpoint: String,
    pub page_size: usize,
    pub max_pages: Option<u32>,
    pub timeout: Option<Duration>,
    /// Larger page bodies end pagination with [`FetchError::ResponseTooLarge`].
    pub max_page_bytes: usize,
}

/// Everything one run of [`fetch_tracks`] produced.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Unique tracks in first-seen order.
    pub tracks: Vec<TrackRecord>,
    /// Pages that returned a decodable body.
    pub pages_fetched: u32,
    /// Records dropped for a missing or already-seen id.
    pub skipped: usize,
    pub stop: StopReason,
}

impl FetchOutcome {
    pub fn error(&self) -> Option<&FetchError> {
        match &self.stop {
            StopReason::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Walks the catalog page by page and collects unique tracks.
///
/// Requests `endpoint?limit=<page_size>&page=<n>` starting at page 1, one
/// request at a time. Stops when `max_pages` is exceeded, when a page is
/// empty or shorter than `page_size`, or on the first error. Errors are
/// logged and reported in [`FetchOutcome::stop`]; this function never fails.
///
/// The short-page check counts raw records, so a full page made entirely of
/// duplicates still advances to the next page.
pub async fn fetch_tracks(client: &reqwest::Client, options: &FetchOptions) -> FetchOutcome {
    let mut collector = Collector::default();
    let mut pages_fetched = 0;
    let mut page: u32 = 1;

    let stop = loop {
        if options.max_pages.is_some_and(|max| page > max) {
            tracing::debug!(page = page, "Page limit reached");
            break StopReason::PageLimit;
        }

        let records = match fetch_page(client, options, page).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(page = page, error = %e, "Failed to fetch catalog page, stopping");
                break StopReason::Failed(e);
            }
        };
        pages_fetched += 1;

        if records.is_empty() {
            tracing::debug!(page = page, "Empty page, reached end of catalog");
            break StopReason::EmptyPage;
        }

        let added = collector.add_page(&records);
        tracing::info!(
            page = page,
            received = records.len(),
            added = added,
            total = collector.tracks.len(),
            "Fetched catalog page"
        );

        if records.len() < options.page_size {
            break StopReason::ShortPage;
        }

        page += 1;
    };

    FetchOutcome {
        tracks: collector.tracks,
        pages_fetched,
        skipped: collector.skipped,
        stop,
    }
}

/// Accumulates unique tracks across pages in first-seen order.
#[derive(Default)]
struct Collector {
    seen: HashSet<TrackId>,
    tracks: Vec<TrackRecord>,
    skipped: usize,
}

impl Collector {
    /// Adds every record with a not-yet-seen id. Returns how many were added.
    fn add_page(&mut self, records: &[Value]) -> usize {
        let before = self.tracks.len();
        for raw in records {
            let Some(track) = TrackRecord::from_value(raw) else {
                self.skipped += 1;
                continue;
            };
            let is_new = match &track.id {
                Some(id) => self.seen.insert(id.clone()),
                None => false,
            };
            if is_new {
                self.tracks.push(track);
            } else {
                self.skipped += 1;
            }
        }
        self.tracks.len() - before
    }
}

/// Builds the request URL for one page, keeping any query the endpoint
/// already carries.
fn page_url(endpoint: &str, page_size: usize, page: u32) -> Result<Url, FetchError> {
    let mut url = Url::parse(endpoint)?;
    url.query_pairs_mut()
        .append_pair("limit", &page_size.to_string())
        .append_pair("page", &page.to_string());
    Ok(url)
}

async fn fetch_page(
    client: &reqwest::Client,
    options: &FetchOptions,
    page: u32,
) -> Result<Vec<Value>, FetchError> {
    let url = page_url(&options.endpoint, options.page_size, page)?;
    let request = client.get(url).send();

    let response = match options.timeout {
        Some(limit) => tokio::time::timeout(limit, request)
            .await
            .map_err(|_| FetchError::Timeout)??,
        None => request.await?,
    };

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, options.max_page_bytes).await?;
    decode_page(&bytes)
}

/// Extracts the `tracks` array from a page body.
///
/// The body must be a JSON object. A missing or non-array `tracks` member
/// reads as an empty page.
fn decode_page(bytes: &[u8]) -> Result<Vec<Value>, FetchError> {
    let body: Value =
        serde_json::from_slice(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

    let Value::Object(mut obj) = body else {
        return Err(FetchError::Decode("expected a JSON object".to_string()));
    };

    match obj.remove("tracks") {
        Some(Value::Array(items)) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
