use url::Url;

use crate::catalog::{TrackId, TrackRecord};

/// Hosts that feed links and images are resolved against.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    /// Public site root, e.g. `https://music.example.com`.
    pub site_url: String,
    /// Origin for relative artwork paths, e.g. `https://cdn.music.example.com`.
    pub asset_host: String,
}

impl SiteUrls {
    pub fn new(site_url: impl Into<String>, asset_host: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            asset_host: asset_host.into(),
        }
    }

    fn site(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    fn assets(&self) -> &str {
        self.asset_host.trim_end_matches('/')
    }

    /// Canonical page for a track.
    ///
    /// - artist, album and track slugs → `<site>/<artist>/<album>/<track>`
    /// - track slug only → `<site>/track/<track>`
    /// - otherwise → `<site>/browse`
    pub fn track_url(&self, track: &TrackRecord) -> String {
        let site = self.site();
        match (
            track.artist.slug.as_deref(),
            track.album.slug.as_deref(),
            track.slug.as_deref(),
        ) {
            (Some(artist), Some(album), Some(slug)) => format!("{site}/{artist}/{album}/{slug}"),
            (_, _, Some(slug)) => format!("{site}/track/{slug}"),
            _ => format!("{site}/browse"),
        }
    }

    /// Stable non-permalink guid for a track id.
    ///
    /// The id is percent-encoded as a single path segment, so `/` and spaces
    /// inside string ids cannot change the URL's shape.
    pub fn guid_url(&self, id: &TrackId) -> String {
        match Url::parse(self.site()) {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push("tracks").push(id.as_str());
                }
                url.into()
            }
            Err(e) => {
                tracing::debug!(
                    site = %self.site_url,
                    error = %e,
                    "Site URL does not parse, guid left unencoded"
                );
                format!("{}/tracks/{}", self.site(), id)
            }
        }
    }

    /// Absolute artwork URL, preferring the track thumbnail over album art.
    ///
    /// Absolute URLs pass through; anything else is joined onto the asset
    /// host. Returns `None` when the track has no artwork at all.
    pub fn image_url(&self, track: &TrackRecord) -> Option<String> {
        let source = track
            .thumbnail
            .as_deref()
            .or(track.album.image.as_deref())?;

        if has_scheme(source) {
            Some(source.to_string())
        } else if source.starts_with('/') {
            Some(format!("{}{}", self.assets(), source))
        } else {
            Some(format!("{}/{}", self.assets(), source))
        }
    }
}

/// True for `http://…`, `https://…` and any other `scheme://…` prefix.
fn has_scheme(s: &str) -> bool {
    match s.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
