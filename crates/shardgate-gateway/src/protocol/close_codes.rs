//! WebSocket close codes
//!
//! Close codes the gateway sends when it drops a connection, and the policy that maps
//! them onto a [`Termination`] class.

use std::collections::HashSet;

use shardgate_common::GatewayConfig;

use crate::connection::Termination;

/// Gateway WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Invalid opcode sent
    UnknownOpcode = 4001,
    /// Invalid payload encoding
    DecodeError = 4002,
    /// Session id is not valid
    InvalidSession = 4006,
    /// Sequence number is not valid for Resume
    InvalidSequence = 4007,
    /// Payloads sent too quickly
    RateLimited = 4008,
    /// Connection expired, resume is possible
    SessionTimeout = 4009,
    /// Invalid shard configuration
    InvalidShard = 4010,
    /// Too many guilds for the shard count
    ShardingRequired = 4011,
    /// Invalid gateway version
    InvalidVersion = 4012,
    /// Invalid intents
    InvalidIntent = 4013,
    /// Intents not permitted for this bot
    DisallowedIntent = 4014,
    /// Bot has been taken offline
    BotOffline = 4914,
    /// Bot has been banned
    BotBanned = 4915,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4001 => Some(Self::UnknownOpcode),
            4002 => Some(Self::DecodeError),
            4006 => Some(Self::InvalidSession),
            4007 => Some(Self::InvalidSequence),
            4008 => Some(Self::RateLimited),
            4009 => Some(Self::SessionTimeout),
            4010 => Some(Self::InvalidShard),
            4011 => Some(Self::ShardingRequired),
            4012 => Some(Self::InvalidVersion),
            4013 => Some(Self::InvalidIntent),
            4014 => Some(Self::DisallowedIntent),
            4914 => Some(Self::BotOffline),
            4915 => Some(Self::BotBanned),
            _ => None,
        }
    }

    /// Name of a raw close code for logs
    #[must_use]
    pub fn label(code: Option<u16>) -> &'static str {
        code.and_then(Self::from_u16).map_or("unknown", Self::name)
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnknownOpcode => "UnknownOpcode",
            Self::DecodeError => "DecodeError",
            Self::InvalidSession => "InvalidSession",
            Self::InvalidSequence => "InvalidSequence",
            Self::RateLimited => "RateLimited",
            Self::SessionTimeout => "SessionTimeout",
            Self::InvalidShard => "InvalidShard",
            Self::ShardingRequired => "ShardingRequired",
            Self::InvalidVersion => "InvalidVersion",
            Self::InvalidIntent => "InvalidIntent",
            Self::DisallowedIntent => "DisallowedIntent",
            Self::BotOffline => "BotOffline",
            Self::BotBanned => "BotBanned",
        }
    }
}

/// Maps close codes onto termination classes
///
/// Which codes are fatal or force a fresh identify depends on the gateway being talked
/// to, so the table is data rather than a fixed match. Codes in neither set are
/// Resumable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseCodePolicy {
    fatal: HashSet<u16>,
    reidentify: HashSet<u16>,
}

impl CloseCodePolicy {
    /// Create a policy from explicit code lists
    pub fn new(
        fatal: impl IntoIterator<Item = u16>,
        reidentify: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            fatal: fatal.into_iter().collect(),
            reidentify: reidentify.into_iter().collect(),
        }
    }

    /// Build the policy from gateway configuration
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.fatal_close_codes.iter().copied(),
            config.reidentify_close_codes.iter().copied(),
        )
    }

    /// Classify a close code; `None` means the peer closed without a code
    #[must_use]
    pub fn classify(&self, code: Option<u16>) -> Termination {
        match code {
            Some(code) if self.fatal.contains(&code) => Termination::Fatal,
            Some(code) if self.reidentify.contains(&code) => Termination::MustReidentify,
            _ => Termination::Resumable,
        }
    }
}

impl Default for CloseCodePolicy {
    fn default() -> Self {
        Self::new(
            [CloseCode::BotOffline.as_u16(), CloseCode::BotBanned.as_u16()],
            [
                CloseCode::InvalidSession.as_u16(),
                CloseCode::InvalidSequence.as_u16(),
            ],
        )
    }
}
