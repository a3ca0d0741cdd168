//! Gateway events
//!
//! Event names, the intents they require, and typed payloads for message events.

mod event_types;
mod payloads;

pub use event_types::{EventType, UnknownEventType};
pub use payloads::{
    Embed, EmbedField, EmbedThumbnail, Member, Message, MessageAttachment, MessageReference,
    MessageToCreate, User,
};
