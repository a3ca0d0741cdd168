//! Telemetry and tracing setup

mod panic_hook;
mod tracing_setup;

pub use panic_hook::{install_panic_hook, panic_message};
pub use tracing_setup::{
    try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError,
};
