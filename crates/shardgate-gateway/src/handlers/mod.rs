//! Frame handlers
//!
//! Built-in handling of control frames, and the dispatcher that hands application
//! events to registered callbacks.

mod builtin;
mod dispatcher;
mod error;

pub use builtin::{handle_frame, FrameAction};
pub use dispatcher::{EventDispatcher, EventHandler};
pub use error::{HandlerError, HandlerResult};
