//! Library root for `keyword-bot`.
//!
//! Keyword-bot is a LINE webhook bot designed to:
//! - Receive message events for one or more LINE channels
//! - Map a fixed set of keywords (and their synonyms) to a canned reply
//! - Answer with that reply's text and image
//!
//! The bot has no state beyond its configuration. The chat platform sits
//! behind a trait so the webhook handling can be tested without LINE.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::{info, warn};

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the keyword-bot runtime:
/// - Initializes the crypto provider
/// - Builds the keyword book and the webhook accounts
/// - Serves the HTTP endpoints until Ctrl-C
pub async fn start(config: Config) -> Void {
    info!("Starting keyword-bot ...");

    // Start the crypto provider.
    if crypto::ring::default_provider().install_default().is_err() {
        warn!("A crypto provider was already installed.");
    }

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
