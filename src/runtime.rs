//! Runtime services and shared state for the keyword bot.

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{
        keyword::KeywordBook,
        webhook::{self, WebhookAccount},
    },
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration, the keyword book, and one entry per
/// webhook account. It is designed to be trivially cloneable.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The keyword and synonym tables.
    pub book: Arc<KeywordBook>,
    /// The webhook accounts, in configuration order.
    pub accounts: Vec<WebhookAccount>,
}

impl Runtime {
    /// Create a new runtime instance.
    ///
    /// Fails when the keyword tables are invalid. Missing credentials do not
    /// fail; the affected account only reports them.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Build the keyword book.
        let book = Arc::new(KeywordBook::from_config(&config)?);

        // Build the accounts.
        let accounts = config.accounts.iter().map(|account| WebhookAccount::from_config(account, &config, book.clone())).collect::<Res<Vec<_>>>()?;

        Ok(Self { config, book, accounts })
    }

    /// The application router.
    pub fn router(&self) -> Router {
        webhook::router(&self.config, &self.accounts)
    }

    /// Serve until Ctrl-C.
    pub async fn start(&self) -> Void {
        let address = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(address).await?;

        info!("Server running on port {}", self.config.port);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down ...");
            })
            .await?;

        Ok(())
    }
}
