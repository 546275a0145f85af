//! HTTP surface: per-account webhook endpoints, the health page and images.

use std::{fmt::Write, sync::Arc};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        config::{AccountConfig, ChannelCredentials, Config},
        types::{Res, WebhookBody},
    },
    service::chat::{ChatClient, line},
};

use super::{dispatch::Dispatcher, keyword::KeywordBook};

/// A configured account: what is needed to verify and answer its requests.
#[derive(Clone)]
pub struct LinkedChannel {
    pub channel_secret: String,
    pub dispatcher: Dispatcher,
}

/// One webhook endpoint.
///
/// When `channel` is `None` the credentials were missing at start, and the
/// endpoint only reports that.
#[derive(Clone)]
pub struct WebhookAccount {
    pub name: String,
    pub path: String,
    pub credential_prefix: String,
    pub channel: Option<LinkedChannel>,
}

impl WebhookAccount {
    /// An account with credentials, answering through `chat`.
    pub fn linked(account: &AccountConfig, config: &Config, book: Arc<KeywordBook>, channel_secret: impl Into<String>, chat: ChatClient) -> Self {
        let dispatcher = Dispatcher::new(book, chat, account.fallback_mode, &config.fallback_text, config.public_base_url.clone());

        Self {
            name: account.name.clone(),
            path: account.path.clone(),
            credential_prefix: account.credential_prefix.clone(),
            channel: Some(LinkedChannel {
                channel_secret: channel_secret.into(),
                dispatcher,
            }),
        }
    }

    /// An account whose credentials are missing.
    pub fn unlinked(account: &AccountConfig) -> Self {
        Self {
            name: account.name.clone(),
            path: account.path.clone(),
            credential_prefix: account.credential_prefix.clone(),
            channel: None,
        }
    }

    /// Builds the account from configuration, creating a LINE client when credentials are present.
    pub fn from_config(account: &AccountConfig, config: &Config, book: Arc<KeywordBook>) -> Res<Self> {
        let Some(ChannelCredentials { channel_secret, channel_access_token }) = config.credentials_for(account) else {
            warn!("Account `{}` has no {}_CHANNEL_SECRET / {}_CHANNEL_ACCESS_TOKEN; its webhook will not dispatch.", account.name, account.credential_prefix, account.credential_prefix);
            return Ok(Self::unlinked(account));
        };

        let chat = ChatClient::line(config, channel_access_token)?;

        info!("Account `{}` ready at {}.", account.name, account.path);

        Ok(Self::linked(account, config, book, channel_secret.as_str(), chat))
    }

    pub fn is_linked(&self) -> bool {
        self.channel.is_some()
    }
}

/// Builds the application router.
pub fn router(config: &Config, accounts: &[WebhookAccount]) -> Router {
    let health = health_text(&config.public_base_url, accounts);

    let mut router = Router::new().route("/", get(move || async move { health }));

    for account in accounts {
        router = router.route(&account.path, post(handle_webhook).with_state(Arc::new(account.clone())));
    }

    router.nest_service("/images", ServeDir::new(&config.images_dir)).layer(TraceLayer::new_for_http())
}

/// The text served at `/`.
pub fn health_text(public_base_url: &str, accounts: &[WebhookAccount]) -> String {
    let mut text = format!("LINE bot running ✅\nPUBLIC_BASE_URL={public_base_url}\n");

    for account in accounts {
        let state = if account.is_linked() { "SET" } else { "MISSING" };
        let _ = writeln!(text, "{}_KEYS={}", account.credential_prefix, state);
    }

    text
}

/// Handles `POST <account path>`.
#[instrument(skip_all, fields(path = %account.path))]
async fn handle_webhook(State(account): State<Arc<WebhookAccount>>, headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
    let Some(channel) = &account.channel else {
        return (StatusCode::OK, format!("Webhook {} OK, but {} keys missing.", account.path, account.credential_prefix));
    };

    // Verify the signature.

    let signature = headers.get(line::SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();

    if !line::verify_signature(&channel.channel_secret, &body, signature) {
        warn!("Rejecting webhook with an invalid signature.");
        return (StatusCode::UNAUTHORIZED, "invalid signature".to_string());
    }

    // Parse the events.

    let payload: WebhookBody = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("Rejecting webhook with an invalid body: {}", err);
            return (StatusCode::BAD_REQUEST, "invalid body".to_string());
        }
    };

    info!("Received {} event(s) ...", payload.events.len());

    // Dispatch all events and wait for them.

    match channel.dispatcher.handle_batch(&payload.events).await {
        Ok(()) => (StatusCode::OK, "OK".to_string()),
        Err(err) => {
            error!("Webhook error on {}: {:#}", account.path, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "ERR".to_string())
        }
    }
}
