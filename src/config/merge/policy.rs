//! Merge policy: the lowest layer is the serialized default configuration.

use crate::config::DeckConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with `DeckConfig::default()` so every later source only
/// needs to name the keys it overrides.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&DeckConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
