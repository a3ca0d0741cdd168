//! Gateway operation codes

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gateway operation codes
///
/// Numbering follows the push gateway; gaps (3, 4, 5, 8) are codes this client
/// neither sends nor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Event push; the only op carrying `s` and `t`
    Dispatch = 0,
    Heartbeat = 1,
    Identify = 2,
    Resume = 6,
    /// Server asks for a reconnect and resume
    Reconnect = 7,
    /// Identify or Resume was rejected
    InvalidSession = 9,
    /// First frame after connect, carries the heartbeat interval
    Hello = 10,
    HeartbeatAck = 11,
    /// Acknowledges an HTTP callback (webhook mode only)
    HttpCallbackAck = 12,
}

impl OpCode {
    /// Wire value
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Ops only the client sends; receiving one is a server quirk, not an event
    #[must_use]
    pub const fn is_client_op(self) -> bool {
        matches!(self, Self::Heartbeat | Self::Identify | Self::Resume)
    }

    /// Name used in logs
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "Dispatch",
            Self::Heartbeat => "Heartbeat",
            Self::Identify => "Identify",
            Self::Resume => "Resume",
            Self::Reconnect => "Reconnect",
            Self::InvalidSession => "InvalidSession",
            Self::Hello => "Hello",
            Self::HeartbeatAck => "HeartbeatAck",
            Self::HttpCallbackAck => "HttpCallbackAck",
        }
    }
}

impl TryFrom<u8> for OpCode {
    /// The unknown wire value
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            6 => Self::Resume,
            7 => Self::Reconnect,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            12 => Self::HttpCallbackAck,
            unknown => return Err(unknown),
        })
    }
}

impl Serialize for OpCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for OpCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::try_from(value)
            .map_err(|unknown| serde::de::Error::custom(format!("unknown op code {unknown}")))
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
