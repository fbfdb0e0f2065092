use crate::catalog::TrackRecord;
use crate::feed::urls::SiteUrls;
use crate::util::{escape_html, format_duration, pub_date};

/// Title used when the catalog record has none.
pub const UNTITLED: &str = "Untitled";

/// A track resolved into everything one RSS `<item>` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Never a permalink: either a synthetic id URL or the track page.
    pub guid: String,
    pub image_url: Option<String>,
    pub artist: String,
    pub album: String,
    pub duration: String,
    pub bpm: String,
    pub genres: Vec<String>,
    /// HTML fragment, also reused for `content:encoded`.
    pub description: String,
    pub pub_date: Option<String>,
    pub enclosure_url: Option<String>,
}

impl FeedItem {
    pub fn from_track(track: &TrackRecord, urls: &SiteUrls) -> Self {
        let link = urls.track_url(track);
        let guid = match &track.id {
            Some(id) => urls.guid_url(id),
            None => link.clone(),
        };
        let image_url = urls.image_url(track);
        let artist = track.artist.name.clone().unwrap_or_default();
        let album = track.album.name.clone().unwrap_or_default();
        let duration = format_duration(track.duration);
        let bpm = track.bpm.clone().unwrap_or_default();

        let description = describe(
            &artist,
            &album,
            &track.genres.join(", "),
            &bpm,
            &duration,
            image_url.as_deref(),
        );

        Self {
            title: track.title.clone().unwrap_or_else(|| UNTITLED.to_string()),
            link,
            guid,
            image_url,
            artist,
            album,
            duration,
            bpm,
            genres: track.genres.clone(),
            description,
            pub_date: track.created_at.as_deref().map(pub_date),
            enclosure_url: track.audio_url.clone(),
        }
    }

    pub fn genres_joined(&self) -> String {
        self.genres.join(", ")
    }

    /// Genres worth emitting as `<category>`, in source order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.genres
            .iter()
            .map(String::as_str)
            .filter(|g| !g.is_empty())
    }
}

/// Renders the HTML body shown by email templates. Every interpolated value
/// is HTML-escaped here; the XML writer escapes the fragment again as text.
fn describe(
    artist: &str,
    album: &str,
    genres: &str,
    bpm: &str,
    duration: &str,
    image_url: Option<&str>,
) -> String {
    let mut html = String::new();
    if let Some(src) = image_url {
        html.push_str(&format!(
            r#"<p><img src="{}" alt="{}" width="300" /></p>"#,
            escape_html(src),
            escape_html(album)
        ));
    }
    html.push_str(&format!(
        "<p><strong>Artist:</strong> {}<br/>\
         <strong>Album:</strong> {}<br/>\
         <strong>Genres:</strong> {}<br/>\
         <strong>BPM:</strong> {}<br/>\
         <strong>Duration:</strong> {}</p>",
        escape_html(artist),
        escape_html(album),
        escape_html(genres),
        escape_html(bpm),
        escape_html(duration),
    ));
    html
}
