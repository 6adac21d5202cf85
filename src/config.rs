// ⚙️ Configuration - environment variables (and .env) into one Config

use crate::db::validate_table_name;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_NAME: &str = "monster";
pub const DEFAULT_TABLE: &str = "monster_";
pub const DEFAULT_DATA_LOG: &str = "monster_data.txt";
pub const DEFAULT_CHART_PATH: &str = "level_distribution.png";
pub const DEFAULT_EXPORT_PATH: &str = "monsters.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Monster table name (validated identifier)
    pub table: String,

    /// Plain-text log appended on every insert
    pub data_log: PathBuf,

    /// Level distribution chart output
    pub chart_path: PathBuf,

    /// CSV export output
    pub export_path: PathBuf,

    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Read configuration from the process environment, loading `.env` first
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_name = get("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
        let mut db_path = PathBuf::from(db_name.trim());
        if db_path.extension().is_none() {
            db_path.set_extension("db");
        }

        let table = get("MONSTER_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());
        validate_table_name(&table)?;

        let timeout_secs = match get("MONSTER_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("MONSTER_HTTP_TIMEOUT_SECS is not a number: {}", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            db_path,
            table,
            data_log: get("MONSTER_DATA_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_LOG)),
            chart_path: get("MONSTER_CHART_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_PATH)),
            export_path: get("MONSTER_EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH)),
            request_timeout: Duration::from_secs(timeout_secs),
            user_agent: get("MONSTER_USER_AGENT")
                .unwrap_or_else(|| format!("maple-monster/{}", crate::VERSION)),
        })
    }
}
