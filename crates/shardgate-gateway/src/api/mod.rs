//! HTTP API used around the gateway

mod client;

pub use client::{ApiError, OpenApiClient};
