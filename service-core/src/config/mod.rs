//! Settings shared by every service binary in the workspace.

use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

/// Name of the optional settings file, resolved relative to the working
/// directory (`configuration.yaml`, `configuration.toml`, ...).
const SETTINGS_FILE: &str = "configuration";

/// Prefix for environment overrides, e.g. `APP__PORT=9000`.
const ENV_PREFIX: &str = "APP";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// HTTP listen port. `0` binds a random port (used by tests).
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
