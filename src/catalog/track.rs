use serde_json::{Map, Value};

/// Identifier of a catalog record.
///
/// The catalog is free to use strings or numbers for ids. The JSON type is
/// part of the identity, so `"7"` and `7` are distinct records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackId {
    Text(String),
    Number(String),
}

impl TrackId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            Value::Number(n) => Some(Self::Number(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Number(s) => s,
        }
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artist or album reference nested inside a track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credit {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// Only albums carry artwork.
    pub image: Option<String>,
}

/// One catalog entry, reduced to the fields the feed consumes.
///
/// Built leniently from whatever JSON the API returns: any missing field,
/// wrong-typed field or non-object nesting level reads as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackRecord {
    pub id: Option<TrackId>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub artist: Credit,
    pub album: Credit,
    pub thumbnail: Option<String>,
    pub genres: Vec<String>,
    /// Stringified as received (`128`, `"128"`, `127.5`).
    pub bpm: Option<String>,
    /// Whole seconds.
    pub duration: Option<u64>,
    pub created_at: Option<String>,
    pub audio_url: Option<String>,
}

impl TrackRecord {
    /// Extracts a record from a JSON value. Non-objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        Some(Self {
            id: obj.get("id").and_then(TrackId::from_value),
            title: scalar_string(obj, "title"),
            slug: non_empty_string(obj, "slug"),
            artist: credit(obj, "artist"),
            album: credit(obj, "album"),
            thumbnail: non_empty_string(obj, "thumbnail"),
            genres: genres(obj),
            bpm: scalar_string(obj, "bpm"),
            duration: duration_secs(obj),
            created_at: non_empty_string(obj, "created_at"),
            audio_url: non_empty_string(obj, "audio_url"),
        })
    }
}

fn non_empty_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Like [`non_empty_string`] but also accepts numbers and booleans.
fn scalar_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

fn credit(obj: &Map<String, Value>, key: &str) -> Credit {
    match obj.get(key).and_then(Value::as_object) {
        Some(nested) => Credit {
            name: non_empty_string(nested, "name"),
            slug: non_empty_string(nested, "slug"),
            image: non_empty_string(nested, "image"),
        },
        None => Credit::default(),
    }
}

fn genres(obj: &Map<String, Value>) -> Vec<String> {
    obj.get("genres")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn duration_secs(obj: &Map<String, Value>) -> Option<u64> {
    match obj.get("duration")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_full_record() {
        let value = json!({
            "id": 42,
            "title": "Night Drive",
            "slug": "night-drive",
            "artist": {"name": "Neon Coast", "slug": "neon-coast"},
            "album": {"name": "Afterglow", "slug": "afterglow", "image": "/art/afterglow.jpg"},
            "thumbnail": "/thumbs/42.jpg",
            "genres": ["synthwave", "electronic"],
            "bpm": 118,
            "duration": 245,
            "created_at": "2024-01-01T00:00:00Z",
            "audio_url": "https://cdn.example.com/42.mp3"
        });

        let track = TrackRecord::from_value(&value).unwrap();
        assert_eq!(track.id.as_ref().map(ToString::to_string), Some("42".to_string()));
        assert_eq!(track.title.as_deref(), Some("Night Drive"));
        assert_eq!(track.artist.slug.as_deref(), Some("neon-coast"));
        assert_eq!(track.album.image.as_deref(), Some("/art/afterglow.jpg"));
        assert_eq!(track.genres, vec!["synthwave", "electronic"]);
        assert_eq!(track.bpm.as_deref(), Some("118"));
        assert_eq!(track.duration, Some(245));
    }

    #[test]
    fn test_non_object_nesting_reads_as_empty() {
        let value = json!({"id": "a1", "artist": "Neon Coast", "album": null});

        let track = TrackRecord::from_value(&value).unwrap();
        assert_eq!(track.artist, Credit::default());
        assert_eq!(track.album, Credit::default());
    }

    #[test]
    fn test_missing_and_empty_fields_are_absent() {
        let value = json!({"title": "", "slug": "", "genres": "rock"});

        let track = TrackRecord::from_value(&value).unwrap();
        assert!(track.id.is_none());
        assert!(track.title.is_none());
        assert!(track.slug.is_none());
        assert!(track.genres.is_empty());
    }

    #[test]
    fn test_non_object_record_rejected() {
        assert!(TrackRecord::from_value(&json!("not a track")).is_none());
        assert!(TrackRecord::from_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_string_and_number_ids_are_distinct() {
        let a = TrackId::from_value(&json!("7")).unwrap();
        let b = TrackId::from_value(&json!(7)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "7");
        assert_eq!(b.as_str(), "7");
    }

    #[test]
    fn test_null_and_object_ids_are_absent() {
        assert!(TrackId::from_value(&json!(null)).is_none());
        assert!(TrackId::from_value(&json!({"v": 1})).is_none());
        assert!(TrackId::from_value(&json!("")).is_none());
    }

    #[test]
    fn test_fractional_duration_truncated() {
        let track = TrackRecord::from_value(&json!({"duration": 65.9})).unwrap();
        assert_eq!(track.duration, Some(65));

        let track = TrackRecord::from_value(&json!({"duration": -3})).unwrap();
        assert_eq!(track.duration, None);

        let track = TrackRecord::from_value(&json!({"duration": "90"})).unwrap();
        assert_eq!(track.duration, Some(90));
    }

    #[test]
    fn test_non_string_genres_skipped() {
        let track = TrackRecord::from_value(&json!({"genres": ["jazz", 3, null, "", "soul"]})).unwrap();
        assert_eq!(track.genres, vec!["jazz", "", "soul"]);
    }
}
