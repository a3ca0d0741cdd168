//! Gateway frame envelope
//!
//! Every WebSocket text frame is a JSON object `{op, s?, t?, d}`. Inbound frames keep
//! `d` as raw JSON so typed payloads are only decoded by whoever needs them, and keep
//! the original frame text for logging and handlers that want it verbatim.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::{to_raw_value, RawValue};

use super::{IdentifyPayload, OpCode, ProtocolError, ResumePayload};

/// Gateway frame envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayload {
    /// Operation code
    pub op: OpCode,

    /// Sequence number; the resume cursor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event type (Dispatch only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Undecoded event data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Box<RawValue>>,

    /// Frame text as received; empty for outbound frames
    #[serde(skip)]
    pub raw: String,
}

impl GatewayPayload {
    /// Create a frame without data
    #[must_use]
    pub fn new(op: OpCode) -> Self {
        Self {
            op,
            s: None,
            t: None,
            d: None,
            raw: String::new(),
        }
    }

    /// Create a frame carrying `data`
    pub fn with_data<T: Serialize>(op: OpCode, data: &T) -> Result<Self, ProtocolError> {
        let d = to_raw_value(data).map_err(ProtocolError::Encode)?;
        Ok(Self {
            d: Some(d),
            ..Self::new(op)
        })
    }

    // === Client Frames ===

    /// Heartbeat frame (op=1) carrying the last received sequence number
    pub fn heartbeat(last_sequence: u64) -> Result<Self, ProtocolError> {
        Self::with_data(OpCode::Heartbeat, &last_sequence)
    }

    /// Identify frame (op=2)
    pub fn identify(payload: &IdentifyPayload) -> Result<Self, ProtocolError> {
        Self::with_data(OpCode::Identify, payload)
    }

    /// Resume frame (op=6)
    pub fn resume(payload: &ResumePayload) -> Result<Self, ProtocolError> {
        Self::with_data(OpCode::Resume, payload)
    }

    // === Codec ===

    /// Decode a frame, keeping the original text
    pub fn decode(text: impl Into<String>) -> Result<Self, ProtocolError> {
        let raw = text.into();
        let mut frame: Self = serde_json::from_str(&raw).map_err(ProtocolError::Decode)?;
        frame.raw = raw;
        Ok(frame)
    }

    /// Serialize to JSON text
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Decode `d` into a typed payload
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let raw = self
            .d
            .as_ref()
            .ok_or(ProtocolError::MissingData { op: self.op })?;
        serde_json::from_str(raw.get()).map_err(|source| ProtocolError::InvalidData {
            op: self.op,
            source,
        })
    }

    // === Utilities ===

    /// Event type, or `""` when the frame has none
    #[must_use]
    pub fn event_type(&self) -> &str {
        self.t.as_deref().unwrap_or_default()
    }

    /// Check if this is a Dispatch frame of the given event type
    #[must_use]
    pub fn is_event(&self, event_type: &str) -> bool {
        self.op == OpCode::Dispatch && self.event_type() == event_type
    }
}

impl std::fmt::Display for GatewayPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayPayload(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayPayload(op={})", self.op)
        }
    }
}
