//! Normalized message records handed to the bridge

use serde::{Deserialize, Serialize};

/// A message as observed from the client, before classification
#[derive(Debug, Clone, Default)]
pub struct RawPayload {
    /// Account whose working subdirectory holds cached media
    pub sender: String,
    /// Primary markup body
    pub message: String,
    /// Auxiliary markup (mention list lives here)
    pub extra_info: String,
    /// File path hint from message metadata
    pub file_path: String,
    /// Thumbnail path hint from message metadata
    pub thumbnail: String,
}

impl RawPayload {
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_extra_info(mut self, extra_info: impl Into<String>) -> Self {
        self.extra_info = extra_info.into();
        self
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = thumbnail.into();
        self
    }
}

/// Output of a single extractor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractedRecord {
    Mentions { users: Vec<String> },
    Media(MediaReference),
    Location(LocationData),
    Link(LinkData),
    Reply { title: String, reply: ReplyInfo },
    Notice { text: String },
    AppType { tag: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Voice,
    Video,
    File,
    Sticker,
}

/// Where a piece of media can be found
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSource {
    Image { file_path: String },
    Voice { client_msg_id: String },
    Video { file_path: String, thumbnail: String },
    File { file_path: String },
    Sticker { cdn_url: String, aes_key: String },
}

/// Media declared by a message; consumed once by the resolver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaReference {
    pub sender: String,
    pub source: MediaSource,
}

impl MediaReference {
    pub fn kind(&self) -> MediaKind {
        match self.source {
            MediaSource::Image { .. } => MediaKind::Image,
            MediaSource::Voice { .. } => MediaKind::Voice,
            MediaSource::Video { .. } => MediaKind::Video,
            MediaSource::File { .. } => MediaKind::File,
            MediaSource::Sticker { .. } => MediaKind::Sticker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationData {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkData {
    pub title: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyInfo {
    pub id: u64,
    pub sender: String,
}

/// A named binary payload, in either direction across the bridge
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlobData {
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "base64_bytes")]
    pub binary: Vec<u8>,
}

impl BlobData {
    pub fn new(name: impl Into<String>, binary: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            binary,
        }
    }
}

/// Byte arrays travel as base64 strings in bridge JSON
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_json_shape() {
        let blob = BlobData::new("a.png", b"hello".to_vec());
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, r#"{"name":"a.png","binary":"aGVsbG8="}"#);
    }

    #[test]
    fn test_blob_missing_fields_default() {
        let blob: BlobData = serde_json::from_str(r#"{"binary":"aGVsbG8="}"#).unwrap();
        assert_eq!(blob.name, "");
        assert_eq!(blob.binary, b"hello");

        let blob: BlobData = serde_json::from_str(r#"{"name":"x","binary":null}"#).unwrap();
        assert!(blob.binary.is_empty());
    }

    #[test]
    fn test_blob_rejects_bad_base64() {
        let result: Result<BlobData, _> = serde_json::from_str(r#"{"name":"x","binary":"!!"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_media_kind() {
        let reference = MediaReference {
            sender: "wxid_a".to_string(),
            source: MediaSource::Sticker {
                cdn_url: "http://x/y.png".to_string(),
                aes_key: "deadbeef".to_string(),
            },
        };
        assert_eq!(reference.kind(), MediaKind::Sticker);
    }

    #[test]
    fn test_record_serializes_tagged() {
        let record = ExtractedRecord::Reply {
            title: "Hello".to_string(),
            reply: ReplyInfo {
                id: 12345,
                sender: "alice".to_string(),
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "reply");
        assert_eq!(value["reply"]["id"], 12345);
    }
}
