//! Bootstrap HTTP client
//!
//! Resolves gateway connection parameters before any shard connects, and sends
//! messages on behalf of event handlers.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use shardgate_core::{GatewayInfo, Token};
use thiserror::Error;

use crate::events::{Message, MessageToCreate};

/// Errors from the HTTP API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid authorization header: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
}

/// HTTP client for the open platform API
#[derive(Debug, Clone)]
pub struct OpenApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenApiClient {
    /// Create a client authorised with `token`
    pub fn new(
        base_url: impl Into<String>,
        token: &Token,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&token.authorization())?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /gateway/bot`
    pub async fn gateway_info(&self) -> Result<GatewayInfo, ApiError> {
        let url = format!("{}/gateway/bot", self.base_url);
        tracing::debug!(url = %url, "Fetching gateway info");

        let response = self.http.get(&url).send().await?;
        let info: GatewayInfo = Self::decode(response).await?;

        tracing::info!(
            gateway_url = %info.url,
            shards = info.shard_count,
            remaining = info.session_start_limit.remaining,
            max_concurrency = info.session_start_limit.max_concurrency,
            "Gateway info resolved"
        );
        Ok(info)
    }

    /// `POST /channels/{channel_id}/messages`
    pub async fn post_message(
        &self,
        channel_id: &str,
        message: &MessageToCreate,
    ) -> Result<Message, ApiError> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        let response = self.http.post(&url).json(message).send().await?;
        let sent: Message = Self::decode(response).await?;

        tracing::debug!(channel_id = %channel_id, message_id = %sent.id, "Message sent");
        Ok(sent)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}
