//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and TOML loading
//! - [`validation`]: Startup validation collecting every problem at once

mod types;
mod validation;

pub use types::{
    BotConfig, Config, ConfigError, MetricsConfig, SchemaVersion, SearchConfig, StoreConfig,
    TelegramConfig,
};
pub use validation::{ValidationError, validate};
