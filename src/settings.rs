use std::env;

use config::{Config, ConfigError, Environment, File};
use serde_aux::field_attributes::{deserialize_bool_from_anything, deserialize_number_from_string};

#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Production => "production",
        }
    }
}

impl From<&str> for Env {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" => Self::Production,
            _ => Self::Local,
        }
    }
}

impl From<String> for Env {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<Result<String, env::VarError>> for Env {
    fn from(s: Result<String, env::VarError>) -> Self {
        s.unwrap_or_else(|_| "".into()).into()
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    env: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

impl ApplicationSettings {
    pub fn env(&self) -> Env {
        self.env.as_str().into()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    /// Path of the SQLite database file, relative to the working directory.
    pub path: String,
    #[serde(deserialize_with = "deserialize_bool_from_anything")]
    pub create_if_missing: bool,
}

impl Settings {
    /// Reads `configuration/base`, then the file named after `APP_ENVIRONMENT`
    /// (`local` when unset), then `APP_`-prefixed environment variables using
    /// `__` between nested keys, e.g. `APP_APPLICATION__PORT=5556`.
    pub fn load() -> Result<Self, ConfigError> {
        let base_path = env::current_dir().map_err(|e| {
            ConfigError::Message(format!("Failed to determine the current directory: {e}"))
        })?;
        let config_dir = base_path.join("configuration");
        let app_env: Env = env::var("APP_ENVIRONMENT").into();

        Config::builder()
            .add_source(File::from(config_dir.join("base")).required(true))
            .add_source(File::from(config_dir.join(app_env.as_str())).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override("application.env", app_env.as_str())?
            .build()?
            .try_deserialize()
    }
}
