//! Gateway protocol definitions
//!
//! Defines the WebSocket protocol including op codes, frame format, and close codes.

mod close_codes;
mod error;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::{CloseCode, CloseCodePolicy};
pub use error::ProtocolError;
pub use messages::GatewayPayload;
pub use opcodes::OpCode;
pub use payloads::{
    HelloPayload, IdentifyPayload, IdentifyProperties, ReadyPayload, ResumePayload,
};
