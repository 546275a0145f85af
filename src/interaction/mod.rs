//! Event handling and user interactions for the keyword bot.
//!
//! This module provides functionality for handling webhook events:
//! - Normalizing text and looking up keyword replies
//! - Dispatching replies for each event of a batch
//! - Serving the per-account webhook endpoints

pub mod dispatch;
pub mod keyword;
pub mod webhook;
