//! Outbound notification shapes
//!
//! Serialized in the chat-webhook wire format: a sender `username` and a
//! list of rich `embeds`. Files travel next to the JSON as multipart parts
//! and are described by [`Attachment`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A structured message with one or more embeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    /// Sender name shown by the endpoint
    pub username: String,

    pub embeds: Vec<Embed>,
}

/// Rich embedded section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 24-bit RGB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,

    /// RFC 3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// A local file to upload alongside the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Where the file lives on disk
    pub path: PathBuf,

    /// Name the endpoint shows for the file
    pub file_name: String,
}

impl Attachment {
    /// Attach `path` under its own file name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, file_name }
    }
}

/// Attachment descriptor inside `payload_json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: usize,
    pub filename: String,
}

/// Format Unix milliseconds as an RFC 3339 UTC timestamp
pub fn rfc3339_millis(millis: u64) -> Option<String> {
    let millis = i64::try_from(millis).ok()?;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}
