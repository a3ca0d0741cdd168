//! Gateway intents bitflags
//!
//! Intents select which event families the gateway pushes to a session. They are sent
//! as a plain integer in the Identify payload.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Event subscriptions requested at Identify time
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u32 {
        /// Guild create/update/delete, channel create/update/delete
        const GUILDS                  = 1 << 0;
        /// Guild member add/update/remove
        const GUILD_MEMBERS           = 1 << 1;
        /// All messages in guild channels (private bots only)
        const GUILD_MESSAGES          = 1 << 9;
        /// Message reaction add/remove
        const GUILD_MESSAGE_REACTIONS = 1 << 10;
        /// Direct messages
        const DIRECT_MESSAGE          = 1 << 12;
        /// Interaction (button) callbacks
        const INTERACTION             = 1 << 26;
        /// Message audit pass/reject
        const MESSAGE_AUDIT           = 1 << 27;
        /// Forum thread and post events
        const FORUMS_EVENT            = 1 << 28;
        /// Audio playback events
        const AUDIO_ACTION            = 1 << 29;
        /// Messages that @-mention the bot
        const PUBLIC_GUILD_MESSAGES   = 1 << 30;
    }
}

impl Intents {
    /// Intents actually sent on Identify
    ///
    /// The gateway rejects a zero bitmask, so an empty set falls back to `GUILDS`.
    #[must_use]
    pub fn or_default(self) -> Self {
        if self.is_empty() {
            Self::GUILDS
        } else {
            self
        }
    }

    /// Combine the intents required by several handlers
    pub fn combine<I>(intents: I) -> Self
    where
        I: IntoIterator<Item = Intents>,
    {
        intents.into_iter().fold(Intents::empty(), |acc, i| acc | i)
    }

    /// Names of all intents that are set, lowercase
    pub fn list(&self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }
}

impl Default for Intents {
    fn default() -> Self {
        Intents::empty()
    }
}

impl fmt::Display for Intents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Error parsing an intents list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown intent: {0}")]
pub struct IntentsParseError(pub String);

/// Parses either a raw integer (`"1073741825"`) or a comma separated list of
/// names (`"guilds, public_guild_messages"`). Names are case-insensitive; `at_messages`
/// is accepted as an alias of `public_guild_messages`.
impl FromStr for Intents {
    type Err = IntentsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(bits) = s.parse::<u32>() {
            return Ok(Intents::from_bits_truncate(bits));
        }

        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(Intents::empty(), |acc, name| {
                let upper = name.to_ascii_uppercase();
                let flag = match upper.as_str() {
                    "AT_MESSAGES" => Some(Intents::PUBLIC_GUILD_MESSAGES),
                    other => Intents::from_name(other),
                };
                flag.map(|f| acc | f)
                    .ok_or_else(|| IntentsParseError(name.to_string()))
            })
    }
}

impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Intents::from_bits_truncate(bits))
    }
}

impl From<u32> for Intents {
    fn from(bits: u32) -> Self {
        Intents::from_bits_truncate(bits)
    }
}

impl From<Intents> for u32 {
    fn from(intents: Intents) -> Self {
        intents.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_falls_back_to_guilds() {
        assert_eq!(Intents::empty().or_default(), Intents::GUILDS);
        assert_eq!(
            Intents::PUBLIC_GUILD_MESSAGES.or_default(),
            Intents::PUBLIC_GUILD_MESSAGES
        );
    }

    #[test]
    fn test_parse_names() {
        let intents: Intents = "guilds, at_messages".parse().unwrap();
        assert!(intents.contains(Intents::GUILDS));
        assert!(intents.contains(Intents::PUBLIC_GUILD_MESSAGES));
        assert!(!intents.contains(Intents::DIRECT_MESSAGE));

        let intents: Intents = "DIRECT_MESSAGE".parse().unwrap();
        assert_eq!(intents, Intents::DIRECT_MESSAGE);
    }

    #[test]
    fn test_parse_number() {
        let intents: Intents = "1073741825".parse().unwrap();
        assert_eq!(intents, Intents::GUILDS | Intents::PUBLIC_GUILD_MESSAGES);
    }

    #[test]
    fn test_parse_empty_and_unknown() {
        let intents: Intents = "".parse().unwrap();
        assert!(intents.is_empty());

        let err = "guilds,bogus".parse::<Intents>().unwrap_err();
        assert_eq!(err, IntentsParseError("bogus".to_string()));
    }

    #[test]
    fn test_serialize_as_integer() {
        let intents = Intents::GUILDS | Intents::GUILD_MEMBERS;
        assert_eq!(serde_json::to_string(&intents).unwrap(), "3");

        let parsed: Intents = serde_json::from_str("1073741824").unwrap();
        assert_eq!(parsed, Intents::PUBLIC_GUILD_MESSAGES);
    }

    #[test]
    fn test_combine_and_list() {
        let combined = Intents::combine([Intents::GUILDS, Intents::DIRECT_MESSAGE]);
        let names = combined.list();
        assert_eq!(names, vec!["guilds".to_string(), "direct_message".to_string()]);
    }

    #[test]
    fn test_bit_positions() {
        assert_eq!(Intents::GUILDS.bits(), 1);
        assert_eq!(Intents::GUILD_MESSAGES.bits(), 1 << 9);
        assert_eq!(Intents::PUBLIC_GUILD_MESSAGES.bits(), 1 << 30);
    }
}
