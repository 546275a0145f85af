//! LINE Messaging API integration.
//!
//! This module provides the two pieces of the platform the bot talks to:
//! - Verifying the `x-line-signature` of inbound webhook requests
//! - Sending replies through the reply endpoint
//!
//! The reply client implements `GenericChatClient`, so the webhook handlers
//! only ever see a `ChatClient`.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::{debug, instrument, warn};

use crate::base::{
    config::Config,
    types::{OutboundMessage, Res, Void},
};

use super::{ChatClient, GenericChatClient};

// Type aliases.

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Path of the reply endpoint, relative to the API host.
const REPLY_PATH: &str = "/v2/bot/message/reply";

// Extra methods on `ChatClient` applied by the LINE implementation.

impl ChatClient {
    /// Creates a new LINE chat client for one channel access token.
    pub fn line(config: &Config, channel_access_token: &str) -> Res<Self> {
        Ok(LineChatClient::new(&config.line_api_base, channel_access_token)?.into())
    }
}

impl From<LineChatClient> for ChatClient {
    fn from(client: LineChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// Body of a reply request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: &'a [OutboundMessage],
}

/// LINE reply client.
#[derive(Clone)]
pub struct LineChatClient {
    reply_url: String,
    channel_access_token: String,
    client: reqwest::Client,
}

impl LineChatClient {
    /// Create a new LINE chat client against `api_base` (e.g. `https://api.line.me`).
    pub fn new(api_base: &str, channel_access_token: &str) -> Res<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            reply_url: format!("{}{}", api_base.trim_end_matches('/'), REPLY_PATH),
            channel_access_token: channel_access_token.to_string(),
            client,
        })
    }
}

#[async_trait]
impl GenericChatClient for LineChatClient {
    #[instrument(skip_all, fields(messages = messages.len()))]
    async fn reply_message(&self, reply_token: &str, messages: &[OutboundMessage]) -> Void {
        let request = ReplyRequest { reply_token, messages };

        let response = self
            .client
            .post(&self.reply_url)
            .bearer_auth(&self.channel_access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send reply: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("LINE reply failed ({}): {}", status, body));
        }

        debug!("Reply delivered.");

        Ok(())
    }
}

// Signatures.

/// Verify the webhook signature from LINE.
///
/// The signature is the base64 encoded HMAC-SHA256 of the raw body, keyed with the channel secret.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        warn!("Signature header is not valid base64.");
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        warn!("Failed to create HMAC.");
        return false;
    };

    mac.update(body);

    // Constant-time comparison.
    mac.verify_slice(&expected).is_ok()
}

/// Computes the signature LINE would send for `body`.
pub fn sign(channel_secret: &str, body: &[u8]) -> Res<String> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes()).map_err(|e| anyhow::anyhow!("Failed to create HMAC: {}", e))?;
    mac.update(body);

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

// Tests.
