//! Event payload definitions
//!
//! Data structures carried by message events, and the body used to send a message.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// === User Payloads ===

/// User data included in events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bot: bool,
    /// Openid in an associated application
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub union_openid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub union_user_account: String,
}

/// Guild member data included in message events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub joined_at: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub roles: Vec<String>,
}

// === Message Payloads ===

/// Message attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttachment {
    pub url: String,
}

/// Reference to another message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    pub message_id: String,
    #[serde(default)]
    pub ignore_get_message_error: bool,
}

/// Thumbnail of an embed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

/// Field of an embed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

/// Structured embed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Pop-up text shown in the message list
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

/// Message event payload (AT_MESSAGE_CREATE, MESSAGE_CREATE, DIRECT_MESSAGE_CREATE)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub content: String,
    /// RFC 3339 send time
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub edited_timestamp: String,
    #[serde(default)]
    pub mention_everyone: bool,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub attachments: Vec<MessageAttachment>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub mentions: Vec<User>,
    #[serde(default)]
    pub direct_message: bool,
    /// Ordering key within the channel
    #[serde(default)]
    pub seq_in_channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
    /// Guild a direct message was started from
    #[serde(default)]
    pub src_guild_id: String,
}

impl Message {
    /// Parsed send time, if present and well-formed
    #[must_use]
    pub fn sent_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }

    /// Content with `<@...>` mention tags removed and whitespace trimmed
    #[must_use]
    pub fn plain_content(&self) -> String {
        let mut out = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();
        while let Some(start) = rest.find("<@") {
            out.push_str(&rest[..start]);
            match rest[start..].find('>') {
                Some(end) => rest = &rest[start + end + 1..],
                None => {
                    rest = &rest[start..];
                    break;
                }
            }
        }
        out.push_str(rest);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Check if the message mentions the given user
    #[must_use]
    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|u| u.id == user_id)
    }
}

// === Outbound ===

/// Body of a send-message request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageToCreate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Message being replied to; empty means an unsolicited message
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
    /// Event being replied to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_id: String,
}

impl MessageToCreate {
    /// Plain text message
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Reply to a received message
    pub fn reply(content: impl Into<String>, to: &Message) -> Self {
        Self {
            content: content.into(),
            msg_id: to.id.clone(),
            ..Self::default()
        }
    }

    /// Quote the message being replied to
    #[must_use]
    pub fn quoting(mut self, message_id: impl Into<String>) -> Self {
        self.message_reference = Some(MessageReference {
            message_id: message_id.into(),
            ignore_get_message_error: true,
        });
        self
    }
}
