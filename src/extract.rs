//! Field extractors, one per message subtype
//!
//! Every extractor is a pure function of the raw payload. A malformed
//! document, a missing node or a failed number parse all come back as "no
//! match" (`None`, an empty string, or the `0` app type), never as an error.

use crate::markup::Markup;
use crate::record::{
    ExtractedRecord, LinkData, LocationData, MediaReference, MediaSource, RawPayload, ReplyInfo,
};
use tracing::debug;

/// Parse markup, logging and swallowing the error.
///
/// Anything before the first `<` is dropped. Group messages arrive as
/// `sender:\n<msg>...` and some bodies lead with blank lines before the
/// declaration.
fn parse(text: &str) -> Option<Markup<'_>> {
    let start = text.find('<')?;
    match Markup::parse(&text[start..]) {
        Ok(markup) => Some(markup),
        Err(e) => {
            debug!(error = %e, "unparseable markup");
            None
        }
    }
}

/// Users mentioned in a group message, read from the extra-info markup
pub fn mentions(payload: &RawPayload) -> Option<Vec<String>> {
    let markup = parse(&payload.extra_info)?;
    let list = markup.text("/msgsource/atuserlist")?;

    let users: Vec<String> = list
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string)
        .collect();

    if users.is_empty() {
        None
    } else {
        Some(users)
    }
}

pub fn image(payload: &RawPayload) -> Option<MediaReference> {
    if payload.file_path.is_empty() {
        return None;
    }
    Some(MediaReference {
        sender: payload.sender.clone(),
        source: MediaSource::Image {
            file_path: payload.file_path.clone(),
        },
    })
}

pub fn voice(payload: &RawPayload) -> Option<MediaReference> {
    let markup = parse(&payload.message)?;
    let client_msg_id = markup.text("/msg/voicemsg/@clientmsgid")?;

    Some(MediaReference {
        sender: payload.sender.clone(),
        source: MediaSource::Voice { client_msg_id },
    })
}

pub fn video(payload: &RawPayload) -> Option<MediaReference> {
    if payload.file_path.is_empty() && payload.thumbnail.is_empty() {
        return None;
    }
    Some(MediaReference {
        sender: payload.sender.clone(),
        source: MediaSource::Video {
            file_path: payload.file_path.clone(),
            thumbnail: payload.thumbnail.clone(),
        },
    })
}

pub fn file(payload: &RawPayload) -> Option<MediaReference> {
    if payload.file_path.is_empty() {
        return None;
    }
    Some(MediaReference {
        sender: payload.sender.clone(),
        source: MediaSource::File {
            file_path: payload.file_path.clone(),
        },
    })
}

/// Sticker CDN location and key, found on any element of the document
pub fn sticker(payload: &RawPayload) -> Option<MediaReference> {
    let markup = parse(&payload.message)?;
    let cdn_url = markup.text("//@cdnurl")?;
    let aes_key = markup.text("//@aeskey")?;

    Some(MediaReference {
        sender: payload.sender.clone(),
        source: MediaSource::Sticker { cdn_url, aes_key },
    })
}

pub fn location(payload: &RawPayload) -> Option<LocationData> {
    let markup = parse(&payload.message)?;
    let latitude: f64 = markup.text("/msg/location/@x")?.parse().ok()?;
    let longitude: f64 = markup.text("/msg/location/@y")?.parse().ok()?;

    Some(LocationData {
        name: markup.text_or_default("/msg/location/@poiname"),
        address: markup.text_or_default("/msg/location/@label"),
        latitude,
        longitude,
    })
}

/// Rich card subtype; 0 when absent or not a number
pub fn app_type(payload: &RawPayload) -> i64 {
    parse(&payload.message)
        .and_then(|markup| markup.text("/msg/appmsg/type"))
        .and_then(|tag| tag.trim().parse().ok())
        .unwrap_or(0)
}

pub fn link(payload: &RawPayload) -> Option<LinkData> {
    let markup = parse(&payload.message)?;
    let title = markup.text("/msg/appmsg/title")?;

    Some(LinkData {
        title,
        description: markup.text_or_default("/msg/appmsg/des"),
        url: markup.text_or_default("/msg/appmsg/url"),
    })
}

/// Quoted reply: the reply text plus the message it refers to
pub fn reply(payload: &RawPayload) -> Option<(String, ReplyInfo)> {
    let markup = parse(&payload.message)?;
    let title = markup.text("/msg/appmsg/title")?;
    let svrid = markup.text("/msg/appmsg/refermsg/svrid")?;
    let sender = markup
        .text("/msg/appmsg/refermsg/chatusr")
        .or_else(|| markup.text("/msg/appmsg/refermsg/fromusr"))?;
    // Plain decimal digits only; no sign
    if !svrid.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = svrid.parse::<u64>().ok()?;

    Some((title, ReplyInfo { id, sender }))
}

/// Group announcement text
pub fn notice(payload: &RawPayload) -> String {
    parse(&payload.message)
        .map(|markup| markup.text_or_default("/msg/appmsg/textannouncement"))
        .unwrap_or_default()
}

pub fn revoke(payload: &RawPayload) -> String {
    parse(&payload.message)
        .map(|markup| markup.text_or_default("/revokemsg"))
        .unwrap_or_default()
}

pub const VOIP_CALL_STARTED: &str = "VoIP: Started a call";
pub const VOIP_CALL_ENDED: &str = "VoIP: Call ended";

/// One-to-one call events: either an invitation status or a call bubble
pub fn private_voip(payload: &RawPayload) -> String {
    let Some(markup) = parse(&payload.message) else {
        return String::new();
    };

    if markup.find_first("/voipinvitemsg").is_some() {
        if let Some(status) = markup.find_first("/voipinvitemsg/status") {
            return match status.inner_text().as_str() {
                "1" => VOIP_CALL_STARTED.to_string(),
                "2" => VOIP_CALL_ENDED.to_string(),
                other => format!("VoIP: Unknown status {}", other),
            };
        }
    }

    if markup.find_first("/voipmsg").is_some() {
        if let Some(bubble) = markup.find_first("//msg") {
            return format!("VoIP: {}", bubble.inner_text());
        }
    }

    String::new()
}

/// System messages; only group call notices are surfaced
pub fn system(payload: &RawPayload) -> String {
    let Some(markup) = parse(&payload.message) else {
        return String::new();
    };

    ["/sysmsg/voipmt/invite", "/sysmsg/voipmt/banner"]
        .iter()
        .find_map(|path| markup.find_first(path))
        .map(|node| format!("VoIP: {}", node.inner_text()))
        .unwrap_or_default()
}

/// Wrap a free-text result, treating empty as nothing to report
pub(crate) fn notice_record(text: String) -> Option<ExtractedRecord> {
    if text.is_empty() {
        None
    } else {
        Some(ExtractedRecord::Notice { text })
    }
}
