//! Configuration loading.
//!
//! Values come from an optional `config/default.{toml,yaml,json,...}` file
//! and from `ILLCHI__*` environment variables (`ILLCHI__PEER__BROKER`,
//! `ILLCHI__SEND__TIMEOUT_MS`, ...), environment winning. Anything left
//! unset falls back to [`Settings::default`].

mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{LogSettings, PeerSettings, SendSettings, Settings};

/// Prefix of the environment variables read by [`load_config`].
pub const ENV_PREFIX: &str = "ILLCHI";

/// Loads the configuration from `config/default` and the environment.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Like [`load_config`], reading the (optional) file at `path` instead.
/// The extension may be left out.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}
