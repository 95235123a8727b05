//! DialogLens command-line layer
//!
//! Exposes modules for integration testing

pub mod bot_content;
pub mod cli;
pub mod config;
pub mod discovery;

pub use config::AppConfig;
