use config::{Config, Environment as EnvironmentSource, File};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub processing: ProcessingSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub root_path: String,
    pub max_upload_size_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingSettings {
    /// Executable invoked for the audio stages.
    pub command: String,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Defaults, overlaid with an optional `appsettings.{env}` file, then
    /// `APP_`-prefixed environment variables.
    pub fn load(environment: Environment) -> Result<Self, config::ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000i64)?
            .set_default("database.url", "sqlite://rookery.db")?
            .set_default("database.max_connections", 5i64)?
            .set_default("database.run_migrations", true)?
            .set_default("storage.root_path", "./data")?
            .set_default("storage.max_upload_size_bytes", 524_288_000i64)?
            .set_default("processing.command", "audio-pipeline")?
            .set_default("processing.queue_capacity", 64i64)?
            .set_default("logging.level", "info")?
            .set_default("logging.enable_json", false)?
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(EnvironmentSource::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
