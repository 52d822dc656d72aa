use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

use lensgraph_types::{RecencyWindow, DEFAULT_RECENT_DAYS};

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    pub recent_days: u32,
    pub include_year_ago_week: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub feed: Feed,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file(PathBuf::from("lensgraph.toml"))
    }

    /// Defaults, then the TOML file if it exists, then environment overrides
    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database.path", "lensgraph.db")?
            .set_default("feed.recent_days", i64::from(DEFAULT_RECENT_DAYS))?
            .set_default("feed.include_year_ago_week", false)?;

        if path.exists() {
            builder = builder.add_source(File::from(path).required(false));
        }

        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(days) = std::env::var("LENSGRAPH_FEED_DAYS") {
            builder = builder.set_override("feed.recent_days", days)?;
        }
        if let Ok(year_ago) = std::env::var("LENSGRAPH_YEAR_AGO") {
            builder = builder.set_override("feed.include_year_ago_week", year_ago)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn recency_window(&self) -> RecencyWindow {
        RecencyWindow::last_days(self.feed.recent_days)
            .with_year_ago(self.feed.include_year_ago_week)
    }
}
