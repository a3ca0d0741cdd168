//! Session orchestration and start pacing

mod manager;
mod pacing;

pub use manager::{build_sessions, ResumeTrigger, SessionManager};
pub use pacing::{calc_interval, CONCURRENCY_WINDOW};
