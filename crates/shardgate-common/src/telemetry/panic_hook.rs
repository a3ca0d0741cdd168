//! Panic reporting
//!
//! Routes panic messages through `tracing` so they land in the same sink as every
//! other log line, with a backtrace attached. Panics inside shard connections are
//! still caught and recovered by the caller; this only reports them.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, PanicHookInfo};

/// Replace the default panic hook with one that logs through `tracing`
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let (message, location) = describe(info);
        let backtrace = Backtrace::force_capture();
        tracing::error!(
            panic = %message,
            location = %location,
            backtrace = %backtrace,
            "Panic"
        );
    }));
}

/// Extract the message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
        .to_string()
}

fn describe(info: &PanicHookInfo<'_>) -> (String, String) {
    let message = panic_message(info.payload());
    let location = info
        .location()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);
    (message, location)
}
