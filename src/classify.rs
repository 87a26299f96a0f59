//! Message classifier
//!
//! Routes a payload to its extractor based on the kind tag the transport
//! already assigned. Content is never sniffed to pick a route.

use crate::extract;
use crate::record::{ExtractedRecord, RawPayload};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// App message subtypes with dedicated handling
pub const APP_TYPE_FILE: i64 = 6;
pub const APP_TYPE_REPLY: i64 = 57;
pub const APP_TYPE_ANNOUNCEMENT: i64 = 87;

/// Outer message kind, as tagged by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    Video,
    File,
    Sticker,
    Location,
    App,
    Revoke,
    PrivateVoip,
    System,
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "voice" => Ok(Self::Voice),
            "video" => Ok(Self::Video),
            "file" => Ok(Self::File),
            "sticker" | "emoji" => Ok(Self::Sticker),
            "location" => Ok(Self::Location),
            "app" => Ok(Self::App),
            "revoke" => Ok(Self::Revoke),
            "voip" | "private_voip" => Ok(Self::PrivateVoip),
            "system" => Ok(Self::System),
            other => Err(format!("unknown message kind: {}", other)),
        }
    }
}

/// One extraction routine. Every variant answers the same question: what
/// record, if any, does this payload carry?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Mentions,
    Image,
    Voice,
    Video,
    File,
    Sticker,
    Location,
    Link,
    Reply,
    Notice,
    Revoke,
    PrivateVoip,
    System,
    AppType,
}

impl Extractor {
    pub fn extract(self, payload: &RawPayload) -> Option<ExtractedRecord> {
        match self {
            Extractor::Mentions => {
                extract::mentions(payload).map(|users| ExtractedRecord::Mentions { users })
            }
            Extractor::Image => extract::image(payload).map(ExtractedRecord::Media),
            Extractor::Voice => extract::voice(payload).map(ExtractedRecord::Media),
            Extractor::Video => extract::video(payload).map(ExtractedRecord::Media),
            Extractor::File => extract::file(payload).map(ExtractedRecord::Media),
            Extractor::Sticker => extract::sticker(payload).map(ExtractedRecord::Media),
            Extractor::Location => extract::location(payload).map(ExtractedRecord::Location),
            Extractor::Link => extract::link(payload).map(ExtractedRecord::Link),
            Extractor::Reply => {
                extract::reply(payload).map(|(title, reply)| ExtractedRecord::Reply { title, reply })
            }
            Extractor::Notice => extract::notice_record(extract::notice(payload)),
            Extractor::Revoke => extract::notice_record(extract::revoke(payload)),
            Extractor::PrivateVoip => extract::notice_record(extract::private_voip(payload)),
            Extractor::System => extract::notice_record(extract::system(payload)),
            Extractor::AppType => Some(ExtractedRecord::AppType {
                tag: extract::app_type(payload),
            }),
        }
    }
}

/// Which extractor reads the main record of an app message
pub fn app_extractor(app_type: i64, payload: &RawPayload) -> Extractor {
    match app_type {
        APP_TYPE_REPLY => Extractor::Reply,
        APP_TYPE_ANNOUNCEMENT => Extractor::Notice,
        APP_TYPE_FILE if !payload.file_path.is_empty() => Extractor::File,
        _ => Extractor::Link,
    }
}

impl MessageKind {
    /// Extractor for the main record of this kind. Text messages carry no
    /// record beyond their mentions.
    pub fn extractor(self, payload: &RawPayload) -> Option<Extractor> {
        match self {
            MessageKind::Text => None,
            MessageKind::Image => Some(Extractor::Image),
            MessageKind::Voice => Some(Extractor::Voice),
            MessageKind::Video => Some(Extractor::Video),
            MessageKind::File => Some(Extractor::File),
            MessageKind::Sticker => Some(Extractor::Sticker),
            MessageKind::Location => Some(Extractor::Location),
            MessageKind::App => Some(app_extractor(extract::app_type(payload), payload)),
            MessageKind::Revoke => Some(Extractor::Revoke),
            MessageKind::PrivateVoip => Some(Extractor::PrivateVoip),
            MessageKind::System => Some(Extractor::System),
        }
    }
}

/// A payload after classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedMessage {
    pub kind: MessageKind,
    /// Rich card subtype, only set for app messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_type: Option<i64>,
    /// Main record, or None when the payload was not recognized
    pub record: Option<ExtractedRecord>,
    /// Mentioned users, read independently of the main record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<String>>,
}

/// Classify one payload. A bad payload degrades to `record: None`.
pub fn classify(kind: MessageKind, payload: &RawPayload) -> ClassifiedMessage {
    let app_type = match kind {
        MessageKind::App => Some(extract::app_type(payload)),
        _ => None,
    };

    let record = kind.extractor(payload).and_then(|extractor| {
        let record = extractor.extract(payload);
        if record.is_none() {
            debug!(?kind, ?extractor, sender = %payload.sender, "payload not recognized");
        }
        record
    });

    ClassifiedMessage {
        kind,
        app_type,
        record,
        mentions: extract::mentions(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MediaSource, ReplyInfo};

    #[test]
    fn test_kind_from_str() {
        assert_eq!("image".parse::<MessageKind>(), Ok(MessageKind::Image));
        assert_eq!("Sticker".parse::<MessageKind>(), Ok(MessageKind::Sticker));
        assert_eq!("voip".parse::<MessageKind>(), Ok(MessageKind::PrivateVoip));
        assert!("carrier-pigeon".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_app_routes_reply() {
        let payload = RawPayload::new(
            "wxid_self",
            "<msg><appmsg><title>Hello</title><type>57</type><refermsg><svrid>12345</svrid><chatusr>alice</chatusr></refermsg></appmsg></msg>",
        );
        let classified = classify(MessageKind::App, &payload);
        assert_eq!(classified.app_type, Some(57));
        assert_eq!(
            classified.record,
            Some(ExtractedRecord::Reply {
                title: "Hello".to_string(),
                reply: ReplyInfo {
                    id: 12345,
                    sender: "alice".to_string()
                }
            })
        );
    }

    #[test]
    fn test_app_routes_announcement() {
        let payload = RawPayload::new(
            "wxid_self",
            "<msg><appmsg><type>87</type><textannouncement>Meeting at 3</textannouncement></appmsg></msg>",
        );
        assert_eq!(
            classify(MessageKind::App, &payload).record,
            Some(ExtractedRecord::Notice {
                text: "Meeting at 3".to_string()
            })
        );
    }

    #[test]
    fn test_app_routes_file_with_hint() {
        let payload = RawPayload::new("wxid_self", "<msg><appmsg><title>report.pdf</title><type>6</type></appmsg></msg>")
            .with_file_path("wxid_self/FileStorage/File/report.pdf");
        let record = classify(MessageKind::App, &payload).record;
        assert!(matches!(
            record,
            Some(ExtractedRecord::Media(ref r)) if matches!(r.source, MediaSource::File { .. })
        ));

        // Without a path hint the card is shown as a link
        let payload = RawPayload::new("wxid_self", "<msg><appmsg><title>report.pdf</title><type>6</type></appmsg></msg>");
        assert!(matches!(classify(MessageKind::App, &payload).record, Some(ExtractedRecord::Link(_))));
    }

    #[test]
    fn test_app_defaults_to_link() {
        let payload = RawPayload::new(
            "wxid_self",
            "<msg><appmsg><title>News</title><type>5</type><url>https://example.com</url></appmsg></msg>",
        );
        let classified = classify(MessageKind::App, &payload);
        assert_eq!(classified.app_type, Some(5));
        assert!(matches!(classified.record, Some(ExtractedRecord::Link(ref l)) if l.url == "https://example.com"));
    }

    #[test]
    fn test_classifier_does_not_sniff() {
        // A location body routed as a revoke yields nothing
        let payload = RawPayload::new("wxid_self", r#"<msg><location x="1" y="2"/></msg>"#);
        assert_eq!(classify(MessageKind::Revoke, &payload).record, None);
        assert!(classify(MessageKind::Location, &payload).record.is_some());
    }

    #[test]
    fn test_mentions_independent_of_record() {
        let payload = RawPayload::new("wxid_self", "not markup")
            .with_extra_info("<msgsource><atuserlist>wxid_a,wxid_b</atuserlist></msgsource>");
        let classified = classify(MessageKind::Location, &payload);
        assert_eq!(classified.record, None);
        assert_eq!(
            classified.mentions,
            Some(vec!["wxid_a".to_string(), "wxid_b".to_string()])
        );
    }

    #[test]
    fn test_text_has_no_record() {
        let classified = classify(MessageKind::Text, &RawPayload::new("wxid_self", "hi"));
        assert_eq!(classified.record, None);
        assert_eq!(classified.app_type, None);
    }

    #[test]
    fn test_empty_notice_is_unrecognized() {
        let payload = RawPayload::new("wxid_self", "<sysmsg type=\"pat\"/>");
        assert_eq!(classify(MessageKind::System, &payload).record, None);
    }

    #[test]
    fn test_app_type_extractor_sentinel() {
        let payload = RawPayload::new("wxid_self", "<msg/>");
        assert_eq!(
            Extractor::AppType.extract(&payload),
            Some(ExtractedRecord::AppType { tag: 0 })
        );
    }
}
