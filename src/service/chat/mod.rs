pub mod line;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{OutboundMessage, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the outbound side of a chat platform. Implementing it
/// allows a different platform (or a mock) to be used by the dispatcher.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Reply to an inbound event.
    ///
    /// The messages are delivered in order, in one call that either succeeds
    /// or fails as a whole.
    async fn reply_message(&self, reply_token: &str, messages: &[OutboundMessage]) -> Void;
}

// Structs.

/// Chat client for one account.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
