//! Configuration management for spectro.
//!
//! Loads the TOML configuration from the user's config directory, creating it
//! with defaults on first run.

pub mod file;

pub use file::{get_config_path, SpectroConfig};
