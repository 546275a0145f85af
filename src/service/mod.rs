//! Service integrations for external APIs and clients.
//!
//! Currently this is only the chat platform (LINE). The module defines a
//! generic trait and a concrete implementation, so the webhook handlers can
//! be tested against a mock.

pub mod chat;
