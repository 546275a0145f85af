//! Core components, types, and utilities for the keyword bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The built-in keyword and synonym tables.
//! - Common types and result handling.

pub mod config;
pub mod keywords;
pub mod types;
