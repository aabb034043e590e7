use std::path::PathBuf;

use anyhow::{Context, bail};
use serde::Deserialize;

use crudlayer::prelude::DEFAULT_PAGE_SIZE;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "CRUDLAYER_ENV";
const CONFIG_DIR_ENV: &str = "CRUDLAYER_CONFIG_DIR";
const ENV_PREFIX: &str = "CRUDLAYER";

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub mongodb: MongoDbSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub store: StoreSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, the base file, the environment file and
    /// `CRUDLAYER_*` variables, e.g. `CRUDLAYER_MONGODB__HOST`.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = config::Config::builder()
            .add_source(config::File::from(config_dir.join("base.toml")).required(false))
            .add_source(
                config::File::from(config_dir.join(format!("{environment}.toml"))).required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        let settings: Settings = builder
            .build()
            .with_context(|| "failed to build configuration")?
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            bail!("server.port must not be 0");
        }
        if self.search.page_size < 1 {
            bail!("search.page_size must be at least 1");
        }
        if self.store.backend == StoreKind::MongoDb {
            if self.mongodb.host.is_empty() {
                bail!("mongodb.host is required");
            }
            if self.mongodb.port == 0 {
                bail!("mongodb.port must not be 0");
            }
            if self.mongodb.database.is_empty() {
                bail!("mongodb.database is required");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbSettings {
    #[serde(default = "MongoDbSettings::default_host")]
    pub host: String,
    #[serde(default = "MongoDbSettings::default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "MongoDbSettings::default_database")]
    pub database: String,
    #[serde(default = "MongoDbSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl MongoDbSettings {
    fn default_host() -> String {
        "localhost".to_string()
    }

    fn default_port() -> u16 {
        27017
    }

    fn default_database() -> String {
        "crud".to_string()
    }

    fn default_timeout_ms() -> u64 {
        3000
    }
}

impl Default for MongoDbSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            user: String::new(),
            password: String::new(),
            database: Self::default_database(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "SearchSettings::default_page_size")]
    pub page_size: u64,
}

impl SearchSettings {
    fn default_page_size() -> u64 {
        DEFAULT_PAGE_SIZE
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: Self::default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "TelemetrySettings::default_log_level")]
    pub log_level: String,
}

impl TelemetrySettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: Self::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreKind,
}

/// Which document store backs the resources.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    MongoDb,
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Settings {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();

        assert_eq!(settings.server.address(), "0.0.0.0:8080");
        assert_eq!(settings.mongodb.port, 27017);
        assert_eq!(settings.search.page_size, 10);
        assert_eq!(settings.store.backend, StoreKind::MongoDb);
        settings.validate().unwrap();
    }

    #[test]
    fn reads_sections_from_toml() {
        let settings = from_toml(
            r#"
            [mongodb]
            host = "mongo"
            user = "root"
            password = "secret"
            database = "library"

            [search]
            page_size = 2

            [telemetry]
            log_format = "json"

            [store]
            backend = "memory"
            "#,
        );

        assert_eq!(settings.mongodb.host, "mongo");
        assert_eq!(settings.mongodb.database, "library");
        assert_eq!(settings.mongodb.timeout_ms, 3000);
        assert_eq!(settings.search.page_size, 2);
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
        assert_eq!(settings.store.backend, StoreKind::Memory);
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn rejects_zero_page_size() {
        let settings = from_toml("[search]\npage_size = 0\n");

        assert!(settings.validate().is_err());
    }

    #[test]
    fn mongodb_fields_only_required_for_mongodb_store() {
        let mut settings = Settings::default();
        settings.mongodb.database = String::new();
        assert!(settings.validate().is_err());

        settings.store.backend = StoreKind::Memory;
        settings.validate().unwrap();
    }
}
