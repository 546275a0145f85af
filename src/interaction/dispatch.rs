//! Turns inbound events into keyword replies.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{Instrument, debug, info, instrument, warn};

use crate::{
    base::types::{FallbackMode, OutboundMessage, Void, WebhookEvent},
    service::chat::ChatClient,
};

use super::keyword::KeywordBook;

/// Answers the events of one account.
///
/// This is trivially cloneable; the keyword book and the chat client are shared.
#[derive(Clone)]
pub struct Dispatcher {
    book: Arc<KeywordBook>,
    chat: ChatClient,
    fallback_mode: FallbackMode,
    fallback_text: String,
    public_base_url: String,
}

impl Dispatcher {
    /// Creates a dispatcher.
    ///
    /// `fallback_lead` is the text placed before the keyword list in the fixed
    /// fallback reply; `public_base_url` must not end with `/`.
    pub fn new(book: Arc<KeywordBook>, chat: ChatClient, fallback_mode: FallbackMode, fallback_lead: &str, public_base_url: impl Into<String>) -> Self {
        let fallback_text = book.fallback_text(fallback_lead);

        Self {
            book,
            chat,
            fallback_mode,
            fallback_text,
            public_base_url: public_base_url.into(),
        }
    }

    /// Public URL of an image under `/images/`.
    pub fn image_url(&self, file: &str) -> String {
        format!("{}/images/{}", self.public_base_url, file)
    }

    /// The messages to send for a text message, or `None` for no reply.
    pub fn build_reply(&self, text: &str) -> Option<Vec<OutboundMessage>> {
        let keyword = self.book.normalize(Some(text));

        match self.book.resolve(keyword) {
            Some(entry) => Some(vec![OutboundMessage::text(&entry.text), OutboundMessage::image(self.image_url(&entry.file))]),
            None => match self.fallback_mode {
                FallbackMode::Silent => None,
                FallbackMode::FixedMessage => Some(vec![OutboundMessage::text(&self.fallback_text)]),
            },
        }
    }

    /// Handles one event: at most one reply call, errors are returned to the caller.
    #[instrument(skip_all)]
    pub async fn handle_event(&self, event: &WebhookEvent) -> Void {
        // Stickers, images, follows, etc. are ignored.
        let Some(text) = event.text_message() else {
            debug!("Ignoring non-text event.");
            return Ok(());
        };

        let Some(messages) = self.build_reply(text) else {
            debug!("No keyword matched; staying silent.");
            return Ok(());
        };

        let Some(reply_token) = event.reply_token.as_deref() else {
            warn!("Text message event without a reply token; cannot reply.");
            return Ok(());
        };

        info!("Replying with {} message(s) ...", messages.len());

        self.chat.reply_message(reply_token, &messages).await
    }

    /// Handles a batch concurrently and waits for every event to settle.
    ///
    /// Fails if any single event failed; no event is cancelled because another one failed.
    #[instrument(skip_all, fields(events = events.len()))]
    pub async fn handle_batch(&self, events: &[WebhookEvent]) -> Void {
        let results = join_all(events.iter().map(|event| self.handle_event(event).in_current_span())).await;

        let mut failures = results.into_iter().filter_map(Result::err);

        let Some(first) = failures.next() else {
            return Ok(());
        };

        // The caller logs the returned error; the rest are only counted.
        let failed = 1 + failures.inspect(|err| debug!("Additional failure: {}", err)).count();

        Err(first.context(format!("{failed} of {} event(s) failed", events.len())))
    }
}

// Tests.
