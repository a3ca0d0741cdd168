//! Gateway event types
//!
//! Event names carried in the `t` field of Dispatch frames, and the intent each one
//! requires.

use serde::{Deserialize, Serialize};
use shardgate_core::Intents;
use std::fmt;
use std::str::FromStr;

/// Gateway event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Connection events
    /// Sent after successful Identify
    Ready,
    /// Sent after successful Resume
    Resumed,

    // Guild events
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,

    // Member events
    GuildMemberAdd,
    GuildMemberUpdate,
    GuildMemberRemove,

    // Message events (private bots)
    MessageCreate,
    MessageDelete,

    // Reaction events
    MessageReactionAdd,
    MessageReactionRemove,

    // Direct message events
    DirectMessageCreate,
    DirectMessageDelete,

    // Interaction events
    InteractionCreate,

    // Audit events
    MessageAuditPass,
    MessageAuditReject,

    // Forum events
    ForumThreadCreate,
    ForumThreadUpdate,
    ForumThreadDelete,

    // Audio events
    AudioStart,
    AudioFinish,
    AudioOnMic,
    AudioOffMic,

    // Public message events
    /// Message that @-mentions the bot
    AtMessageCreate,
    PublicMessageDelete,
}

impl EventType {
    /// Every known event type
    pub const ALL: [Self; 29] = [
        Self::Ready,
        Self::Resumed,
        Self::GuildCreate,
        Self::GuildUpdate,
        Self::GuildDelete,
        Self::ChannelCreate,
        Self::ChannelUpdate,
        Self::ChannelDelete,
        Self::GuildMemberAdd,
        Self::GuildMemberUpdate,
        Self::GuildMemberRemove,
        Self::MessageCreate,
        Self::MessageDelete,
        Self::MessageReactionAdd,
        Self::MessageReactionRemove,
        Self::DirectMessageCreate,
        Self::DirectMessageDelete,
        Self::InteractionCreate,
        Self::MessageAuditPass,
        Self::MessageAuditReject,
        Self::ForumThreadCreate,
        Self::ForumThreadUpdate,
        Self::ForumThreadDelete,
        Self::AudioStart,
        Self::AudioFinish,
        Self::AudioOnMic,
        Self::AudioOffMic,
        Self::AtMessageCreate,
        Self::PublicMessageDelete,
    ];

    /// Get the string representation of the event type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Resumed => "RESUMED",
            Self::GuildCreate => "GUILD_CREATE",
            Self::GuildUpdate => "GUILD_UPDATE",
            Self::GuildDelete => "GUILD_DELETE",
            Self::ChannelCreate => "CHANNEL_CREATE",
            Self::ChannelUpdate => "CHANNEL_UPDATE",
            Self::ChannelDelete => "CHANNEL_DELETE",
            Self::GuildMemberAdd => "GUILD_MEMBER_ADD",
            Self::GuildMemberUpdate => "GUILD_MEMBER_UPDATE",
            Self::GuildMemberRemove => "GUILD_MEMBER_REMOVE",
            Self::MessageCreate => "MESSAGE_CREATE",
            Self::MessageDelete => "MESSAGE_DELETE",
            Self::MessageReactionAdd => "MESSAGE_REACTION_ADD",
            Self::MessageReactionRemove => "MESSAGE_REACTION_REMOVE",
            Self::DirectMessageCreate => "DIRECT_MESSAGE_CREATE",
            Self::DirectMessageDelete => "DIRECT_MESSAGE_DELETE",
            Self::InteractionCreate => "INTERACTION_CREATE",
            Self::MessageAuditPass => "MESSAGE_AUDIT_PASS",
            Self::MessageAuditReject => "MESSAGE_AUDIT_REJECT",
            Self::ForumThreadCreate => "FORUM_THREAD_CREATE",
            Self::ForumThreadUpdate => "FORUM_THREAD_UPDATE",
            Self::ForumThreadDelete => "FORUM_THREAD_DELETE",
            Self::AudioStart => "AUDIO_START",
            Self::AudioFinish => "AUDIO_FINISH",
            Self::AudioOnMic => "AUDIO_ON_MIC",
            Self::AudioOffMic => "AUDIO_OFF_MIC",
            Self::AtMessageCreate => "AT_MESSAGE_CREATE",
            Self::PublicMessageDelete => "PUBLIC_MESSAGE_DELETE",
        }
    }

    /// Intent the gateway requires before it delivers this event
    #[must_use]
    pub const fn intent(self) -> Intents {
        match self {
            Self::Ready | Self::Resumed => Intents::empty(),
            Self::GuildCreate
            | Self::GuildUpdate
            | Self::GuildDelete
            | Self::ChannelCreate
            | Self::ChannelUpdate
            | Self::ChannelDelete => Intents::GUILDS,
            Self::GuildMemberAdd | Self::GuildMemberUpdate | Self::GuildMemberRemove => {
                Intents::GUILD_MEMBERS
            }
            Self::MessageCreate | Self::MessageDelete => Intents::GUILD_MESSAGES,
            Self::MessageReactionAdd | Self::MessageReactionRemove => {
                Intents::GUILD_MESSAGE_REACTIONS
            }
            Self::DirectMessageCreate | Self::DirectMessageDelete => Intents::DIRECT_MESSAGE,
            Self::InteractionCreate => Intents::INTERACTION,
            Self::MessageAuditPass | Self::MessageAuditReject => Intents::MESSAGE_AUDIT,
            Self::ForumThreadCreate | Self::ForumThreadUpdate | Self::ForumThreadDelete => {
                Intents::FORUMS_EVENT
            }
            Self::AudioStart | Self::AudioFinish | Self::AudioOnMic | Self::AudioOffMic => {
                Intents::AUDIO_ACTION
            }
            Self::AtMessageCreate | Self::PublicMessageDelete => Intents::PUBLIC_GUILD_MESSAGES,
        }
    }

    /// Intent required for a raw event name; unknown names need none
    #[must_use]
    pub fn intents_for(event_type: &str) -> Intents {
        event_type
            .parse::<Self>()
            .map(Self::intent)
            .unwrap_or_default()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an unknown event name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}
