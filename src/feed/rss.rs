use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;

use crate::catalog::TrackRecord;
use crate::feed::item::FeedItem;
use crate::feed::urls::SiteUrls;
use crate::util::{cdata_safe, to_rfc822};

const NS_ATOM: &str = "http://www.w3.org/2005/Atom";
const NS_CONTENT: &str = "http://purl.org/rss/1.0/modules/content/";
const NS_MEDIA: &str = "http://search.yahoo.com/mrss/";

const AUDIO_MIME: &str = "audio/mpeg";

/// Channel-level metadata for the generated document.
#[derive(Debug, Clone)]
pub struct Channel {
    pub title: String,
    pub description: String,
    /// Where the feed itself is published (`atom:link rel="self"`).
    pub feed_url: String,
    pub urls: SiteUrls,
}

/// Serializes tracks as an indented RSS 2.0 document into `sink`.
///
/// `built_at` becomes the channel's `lastBuildDate`. Items appear in the
/// order given; no de-duplication happens here.
pub fn build_feed<W: Write>(
    tracks: &[TrackRecord],
    channel: &Channel,
    built_at: DateTime<Utc>,
    sink: W,
) -> Result<()> {
    let mut writer = Writer::new_with_indent(sink, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", NS_ATOM));
    rss.push_attribute(("xmlns:content", NS_CONTENT));
    rss.push_attribute(("xmlns:media", NS_MEDIA));
    writer
        .write_event(Event::Start(rss))
        .context("Failed to write rss element")?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .context("Failed to write channel element")?;

    text_element(&mut writer, "title", &channel.title)?;
    text_element(&mut writer, "link", channel.urls.site_url.trim_end_matches('/'))?;
    text_element(&mut writer, "description", &channel.description)?;
    text_element(&mut writer, "language", "en-us")?;

    let mut self_link = BytesStart::new("atom:link");
    self_link.push_attribute(("href", channel.feed_url.as_str()));
    self_link.push_attribute(("rel", "self"));
    self_link.push_attribute(("type", "application/rss+xml"));
    writer
        .write_event(Event::Empty(self_link))
        .context("Failed to write atom:link element")?;

    text_element(&mut writer, "lastBuildDate", &to_rfc822(&built_at))?;

    for track in tracks {
        let item = FeedItem::from_track(track, &channel.urls);
        write_item(&mut writer, &item)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .context("Failed to write channel end")?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .context("Failed to write rss end")?;

    let mut sink = writer.into_inner();
    sink.write_all(b"\n").context("Failed to write trailing newline")?;
    sink.flush().context("Failed to flush feed output")?;
    Ok(())
}

/// Renders the feed to an in-memory string.
pub fn render_feed(
    tracks: &[TrackRecord],
    channel: &Channel,
    built_at: DateTime<Utc>,
) -> Result<String> {
    let mut buf = Vec::new();
    build_feed(tracks, channel, built_at, &mut buf)?;
    String::from_utf8(buf).context("Generated feed contains invalid UTF-8")
}

/// Writes the feed to `path` atomically, stamped with the current time.
///
/// Renders into a temporary file in the same directory, syncs to disk, then
/// renames over the destination, so readers never see a half-written feed.
pub fn write_feed(tracks: &[TrackRecord], channel: &Channel, path: &Path) -> Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let content = render_feed(tracks, channel, Utc::now())?;

    // Temp name carries a nanosecond timestamp; create_new refuses an existing file
    let nanos_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", nanos_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary file '{}': check directory permissions",
                temp_path.display()
            )
        })?;

    file.write_all(content.as_bytes()).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to write feed to temporary file '{}'",
            temp_path.display()
        )
    })?;

    file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to sync temporary file '{}' to disk",
            temp_path.display()
        )
    })?;

    drop(file);

    // On Windows, rename fails if destination exists, so remove it first
    #[cfg(windows)]
    if path.exists() {
        std::fs::remove_file(path).with_context(|| {
            let _ = std::fs::remove_file(&temp_path);
            format!("Failed to remove existing '{}' before replace", path.display())
        })?;
    }

    std::fs::rename(&temp_path, path).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}'",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

fn write_item<W: Write>(writer: &mut Writer<W>, item: &FeedItem) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .context("Failed to write item element")?;

    text_element(writer, "title", &item.title)?;
    text_element(writer, "link", &item.link)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer
        .write_event(Event::Start(guid))
        .context("Failed to write guid element")?;
    writer
        .write_event(Event::Text(BytesText::new(&item.guid)))
        .context("Failed to write guid text")?;
    writer
        .write_event(Event::End(BytesEnd::new("guid")))
        .context("Failed to write guid end")?;

    // Plain fields picked up by email template merge tags
    text_element(writer, "artist", &item.artist)?;
    text_element(writer, "album", &item.album)?;
    text_element(writer, "duration", &item.duration)?;
    text_element(writer, "bpm", &item.bpm)?;
    text_element(writer, "genres", &item.genres_joined())?;

    if let Some(image_url) = &item.image_url {
        let mut thumbnail = BytesStart::new("media:thumbnail");
        thumbnail.push_attribute(("url", image_url.as_str()));
        writer
            .write_event(Event::Empty(thumbnail))
            .context("Failed to write media:thumbnail element")?;

        let mut content = BytesStart::new("media:content");
        content.push_attribute(("url", image_url.as_str()));
        content.push_attribute(("medium", "image"));
        writer
            .write_event(Event::Empty(content))
            .context("Failed to write media:content element")?;
    }

    text_element(writer, "description", &item.description)?;

    writer
        .write_event(Event::Start(BytesStart::new("content:encoded")))
        .context("Failed to write content:encoded element")?;
    writer
        .write_event(Event::CData(BytesCData::new(cdata_safe(&item.description))))
        .context("Failed to write content:encoded CDATA")?;
    writer
        .write_event(Event::End(BytesEnd::new("content:encoded")))
        .context("Failed to write content:encoded end")?;

    if let Some(pub_date) = &item.pub_date {
        text_element(writer, "pubDate", pub_date)?;
    }

    if let Some(audio_url) = &item.enclosure_url {
        let mut enclosure = BytesStart::new("enclosure");
        enclosure.push_attribute(("url", audio_url.as_str()));
        enclosure.push_attribute(("type", AUDIO_MIME));
        writer
            .write_event(Event::Empty(enclosure))
            .context("Failed to write enclosure element")?;
    }

    for genre in item.categories() {
        text_element(writer, "category", genre)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("item")))
        .context("Failed to write item end")?;
    Ok(())
}

/// Writes `<name>text</name>`, escaping the text.
fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Credit, TrackId};
    use chrono::TimeZone;

    fn channel() -> Channel {
        Channel {
            title: "Library".to_string(),
            description: "Latest tracks".to_string(),
            feed_url: "https://music.example.com/feed.xml".to_string(),
            urls: SiteUrls::new("https://music.example.com", "https://cdn.example.com"),
        }
    }

    fn built_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn track(id: &str, title: &str) -> TrackRecord {
        TrackRecord {
            id: Some(TrackId::Text(id.to_string())),
            title: Some(title.to_string()),
            slug: Some(id.to_string()),
            ..TrackRecord::default()
        }
    }

    #[test]
    fn test_document_header() {
        let xml = render_feed(&[], &channel(), built_at()).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<rss version="2.0""#));
        assert!(xml.contains(r#"xmlns:atom="http://www.w3.org/2005/Atom""#));
        assert!(xml.contains(r#"xmlns:content="http://purl.org/rss/1.0/modules/content/""#));
        assert!(xml.contains(r#"xmlns:media="http://search.yahoo.com/mrss/""#));
        assert!(xml.contains("<language>en-us</language>"));
        assert!(xml.contains(
            r#"<atom:link href="https://music.example.com/feed.xml" rel="self" type="application/rss+xml"/>"#
        ));
        assert!(xml.contains("<lastBuildDate>Sat, 01 Jun 2024 12:00:00 +0000</lastBuildDate>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_text_fields_escaped() {
        let xml = render_feed(&[track("a", "Salt & <Pepper>")], &channel(), built_at()).unwrap();
        assert!(xml.contains("<title>Salt &amp; &lt;Pepper&gt;</title>"));
    }

    #[test]
    fn test_guid_not_permalink() {
        let xml = render_feed(&[track("a", "A")], &channel(), built_at()).unwrap();
        assert!(xml.contains(
            r#"<guid isPermaLink="false">https://music.example.com/tracks/a</guid>"#
        ));
    }

    #[test]
    fn test_image_elements_only_with_image() {
        let mut with_image = track("a", "A");
        with_image.thumbnail = Some("/x.jpg".to_string());
        let xml = render_feed(&[with_image], &channel(), built_at()).unwrap();
        assert!(xml.contains(r#"<media:thumbnail url="https://cdn.example.com/x.jpg"/>"#));
        assert!(xml.contains(
            r#"<media:content url="https://cdn.example.com/x.jpg" medium="image"/>"#
        ));

        let xml = render_feed(&[track("b", "B")], &channel(), built_at()).unwrap();
        assert!(!xml.contains("media:thumbnail url"));
        assert!(!xml.contains("media:content url"));
        assert!(!xml.contains("&lt;img"));
    }

    #[test]
    fn test_content_encoded_is_cdata() {
        let mut t = track("a", "A");
        t.artist = Credit {
            name: Some("AC/DC & Friends".to_string()),
            ..Credit::default()
        };
        let xml = render_feed(&[t], &channel(), built_at()).unwrap();

        assert!(xml.contains("<content:encoded>"));
        assert!(xml.contains("<![CDATA[<p><strong>Artist:</strong> AC/DC &amp; Friends"));
        // The description carries the same fragment as escaped text
        assert!(xml.contains("&lt;strong&gt;Artist:&lt;/strong&gt; AC/DC &amp;amp; Friends"));
    }

    #[test]
    fn test_enclosure_and_categories() {
        let mut t = track("a", "A");
        t.audio_url = Some("https://cdn.example.com/a.mp3".to_string());
        t.genres = vec!["house".to_string(), String::new(), "techno".to_string()];
        let xml = render_feed(&[t], &channel(), built_at()).unwrap();

        assert!(xml.contains(
            r#"<enclosure url="https://cdn.example.com/a.mp3" type="audio/mpeg"/>"#
        ));
        assert!(xml.contains("<genres>house, , techno</genres>"));
        assert_eq!(xml.matches("<category>").count(), 2);
        let house = xml.find("<category>house</category>").unwrap();
        let techno = xml.find("<category>techno</category>").unwrap();
        assert!(house < techno);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let xml = render_feed(&[track("a", "A")], &channel(), built_at()).unwrap();
        assert!(!xml.contains("<pubDate>"));
        assert!(!xml.contains("<enclosure"));
        assert!(!xml.contains("<category>"));
    }

    #[test]
    fn test_pub_date_formats() {
        let mut good = track("a", "A");
        good.created_at = Some("2024-01-01T00:00:00Z".to_string());
        let mut bad = track("b", "B");
        bad.created_at = Some("not-a-date".to_string());
        let xml = render_feed(&[good, bad], &channel(), built_at()).unwrap();

        assert!(xml.contains("<pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>"));
        assert!(xml.contains("<pubDate>not-a-date</pubDate>"));
    }

    #[test]
    fn test_write_feed_replaces_file() {
        let dir = std::env::temp_dir().join("trackfeed_rss_test_write");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feed.xml");
        std::fs::write(&path, "stale").unwrap();

        write_feed(&[track("a", "A")], &channel(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<?xml"));
        assert!(content.contains("<title>A</title>"));
        // No temp files left behind
        let leftovers = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .count();
        assert_eq!(leftovers, 0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
