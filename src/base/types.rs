//! Common types: result aliases, keyword tables, and the webhook wire format.

use serde::{Deserialize, Serialize};

/// Error type used throughout the crate.
pub type Err = anyhow::Error;
/// Result with the crate error.
pub type Res<T> = Result<T, Err>;
/// Result without a value.
pub type Void = Res<()>;

/// What to do when a text message matches no keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    /// Do not reply at all.
    #[default]
    Silent,
    /// Reply with a single text message listing the valid keywords.
    FixedMessage,
}

/// Reply content for one canonical keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    /// Image file name, relative to the served `/images/` directory.
    pub file: String,
    /// Text sent before the image.
    pub text: String,
}

/// A canonical keyword together with its reply, as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordDefinition {
    /// The canonical keyword.
    pub keyword: String,
    /// Image file name.
    pub file: String,
    /// Reply text.
    pub text: String,
}

impl KeywordDefinition {
    /// Creates a definition.
    pub fn new(keyword: impl Into<String>, file: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            file: file.into(),
            text: text.into(),
        }
    }
}

// Inbound webhook payload.

/// Body of a webhook request from the LINE platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookBody {
    /// User ID of the bot that received the events.
    #[serde(default)]
    pub destination: Option<String>,
    /// The events; absent means an empty batch.
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// Kind of a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A user sent a message.
    Message,
    /// Follow, unfollow, postback, etc.
    #[serde(other)]
    Other,
}

/// Kind of the message inside a message event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Sticker, image, location, etc.
    #[serde(other)]
    Other,
}

/// One webhook event. Only the fields the bot reads are modeled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Token addressing the single reply to this event.
    #[serde(default)]
    pub reply_token: Option<String>,
    /// The message, for message events.
    #[serde(default)]
    pub message: Option<EventMessage>,
}

/// The message carried by a message event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    /// Message kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Text, for text messages.
    #[serde(default)]
    pub text: Option<String>,
}

impl WebhookEvent {
    /// Returns the raw text when this is a text message event.
    ///
    /// A text message without a `text` field yields an empty string.
    pub fn text_message(&self) -> Option<&str> {
        if self.kind != EventKind::Message {
            return None;
        }

        match &self.message {
            Some(message) if message.kind == MessageKind::Text => Some(message.text.as_deref().unwrap_or_default()),
            _ => None,
        }
    }
}

// Outbound messages.

/// One message part of a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// A text message.
    Text {
        /// The text.
        text: String,
    },
    /// An image message.
    Image {
        /// URL of the full image.
        #[serde(rename = "originalContentUrl")]
        original_content_url: String,
        /// URL of the preview.
        #[serde(rename = "previewImageUrl")]
        preview_image_url: String,
    },
}

impl OutboundMessage {
    /// A text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// An image whose preview and full content point at the same URL.
    pub fn image(url: impl Into<String>) -> Self {
        let url = url.into();

        Self::Image {
            original_content_url: url.clone(),
            preview_image_url: url,
        }
    }
}

// Tests.
