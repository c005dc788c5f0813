/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the APOD API, the gallery store and the UI layer.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media an APOD entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    /// Anything else the API reports (interactive pages, etc.)
    #[serde(other)]
    Other,
}

/// One Astronomy Picture of the Day entry, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Calendar date; identity key when matching against saved records
    pub date: NaiveDate,
    pub title: String,
    pub explanation: String,
    pub media_type: MediaType,
    /// Resource locator (image file or embeddable video page)
    #[serde(default)]
    pub url: String,
    /// High-resolution image, when the API has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
}

/// An image the user saved to their gallery
///
/// The `id` is the store's document key and is never written into the
/// document body itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedImageRecord {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub image: ImageRecord,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// Whether the form asks for one date or a start/end pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    #[default]
    Single,
    Range,
}

/// Date form state, holding the text exactly as typed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuerySelection {
    pub mode: QueryMode,
    pub start_date: String,
    /// Only meaningful in `QueryMode::Range`
    pub end_date: String,
    pub submitted: bool,
}

/// A validated request for the APOD API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApodQuery {
    Single(NaiveDate),
    Range { start: NaiveDate, end: NaiveDate },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_api_payload() {
        let json = r#"{
            "date": "2020-01-01",
            "explanation": "A cosmic view.",
            "hdurl": "https://apod.nasa.gov/apod/image/2001/hd.jpg",
            "media_type": "image",
            "service_version": "v1",
            "title": "Betelgeuse Imagined",
            "url": "https://apod.nasa.gov/apod/image/2001/small.jpg"
        }"#;

        let record: ImageRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(record.media_type, MediaType::Image);
        assert_eq!(record.hdurl.as_deref(), Some("https://apod.nasa.gov/apod/image/2001/hd.jpg"));
        assert_eq!(record.copyright, None);
    }

    #[test]
    fn test_unknown_media_type() {
        let json = r#"{"date":"2021-03-04","title":"t","explanation":"e","media_type":"other"}"#;
        let record: ImageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.media_type, MediaType::Other);
        assert!(record.url.is_empty());
    }

    #[test]
    fn test_saved_document_layout() {
        let saved = SavedImageRecord {
            id: "abc".into(),
            image: ImageRecord {
                date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                title: "Title".into(),
                explanation: "Text".into(),
                media_type: MediaType::Video,
                url: "https://www.youtube.com/embed/x".into(),
                hdurl: None,
                copyright: None,
            },
            saved_at: "2024-05-01T12:00:00Z".parse().unwrap(),
        };

        let value = serde_json::to_value(&saved).unwrap();
        let fields = value.as_object().unwrap();

        assert!(!fields.contains_key("id"));
        assert_eq!(fields["date"], "2020-01-01");
        assert_eq!(fields["media_type"], "video");
        assert!(fields.contains_key("savedAt"));

        let mut restored: SavedImageRecord = serde_json::from_value(value).unwrap();
        restored.id = "abc".into();
        assert_eq!(restored, saved);
    }
}
