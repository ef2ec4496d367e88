//! Configuration system for docent.
//!
//! Provides TOML-based configuration with:
//! - One section per concern (`[server]`, `[session]`, `[tools]`,
//!   `[classifier]`, `[vector]`, `[embedding]`, `[generation]`, `[policy]`,
//!   `[prompts]`)
//! - Config file layering (user config dir + project-local `docent.toml`)
//! - API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, Layer, LoadedConfig, load_config, load_config_file, load_config_in,
    user_config_dir,
};
pub use error::{ConfigError, Result};
pub use secrets::{ResolvedSecret, SecretSource, resolve_secret};
pub use types::*;
