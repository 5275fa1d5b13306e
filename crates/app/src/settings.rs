//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and from `SPENDBOOK__*` environment variables
//! (e.g. `SPENDBOOK__ENGINE__TX_TIMEOUT_SECS=10`).
//!
//! ```toml
//! [app]
//! level = "debug"
//!
//! [database]
//! sqlite = "spendbook.db"
//!
//! [engine]
//! tx_timeout_secs = 5
//! conflict_retries = 3
//! ```
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EngineSettings {
    pub tx_timeout_secs: u64,
    pub conflict_retries: u32,
}

impl EngineSettings {
    pub fn tx_timeout(&self) -> Duration {
        Duration::from_secs(self.tx_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Option<Database>,
    pub engine: EngineSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("engine.tx_timeout_secs", 5)?
            .set_default("engine.conflict_retries", 3)?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("SPENDBOOK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Connection string; the file database `spendbook.db` when nothing is
    /// configured.
    pub fn database_url(&self) -> String {
        self.database
            .clone()
            .unwrap_or_else(|| Database::Sqlite("spendbook.db".to_string()))
            .url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_urls() {
        assert_eq!(Database::Memory.url(), "sqlite::memory:");
        assert_eq!(
            Database::Sqlite("books.db".to_string()).url(),
            "sqlite:books.db?mode=rwc"
        );
    }

    #[test]
    fn defaults_apply_without_a_settings_file() {
        let settings: Settings = Config::builder()
            .set_default("app.level", "info")
            .unwrap()
            .set_default("engine.tx_timeout_secs", 5)
            .unwrap()
            .set_default("engine.conflict_retries", 3)
            .unwrap()
            .set_override("database", "memory")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database, Some(Database::Memory));
        assert_eq!(settings.engine.tx_timeout(), Duration::from_secs(5));
        assert_eq!(settings.engine.conflict_retries, 3);
    }
}
