//! Process configuration, read once at startup from the environment (and `.env` via dotenvy).

use crate::error::ConfigError;
use crate::intent::{QueryLimits, DEFAULT_LIMIT, MAX_LIMIT};
use std::str::FromStr;
use std::time::Duration;

/// Tables served when `TABLES` is not set.
pub const DEFAULT_TABLES: &[&str] = &["cars", "motorcycles", "boats"];

/// How the three statements of one request are read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadConsistency {
    /// Fan out the three reads concurrently; counts and page may see different points in time.
    #[default]
    Concurrent,
    /// Run the three reads in one read transaction.
    Snapshot,
}

impl FromStr for ReadConsistency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concurrent" => Ok(ReadConsistency::Concurrent),
            "snapshot" => Ok(ReadConsistency::Snapshot),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Trusted allow-list of table identifiers.
    pub tables: Vec<String>,
    pub limits: QueryLimits,
    pub query_timeout: Duration,
    pub consistency: ReadConsistency,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".into(),
            port: 3000,
            database_url: "sqlite://./data/db.sqlite".into(),
            max_connections: 5,
            tables: DEFAULT_TABLES.iter().map(|t| t.to_string()).collect(),
            limits: QueryLimits::default(),
            query_timeout: Duration::from_millis(5000),
            consistency: ReadConsistency::Concurrent,
        }
    }
}

fn parsed<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}

impl Settings {
    /// Load `.env` if present, then read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let dir = var("WORKING_DIRECTORY").unwrap_or_else(|| ".".into());
                format!("sqlite://{}/data/db.sqlite", dir.trim_end_matches('/'))
            }
        };
        let tables: Vec<String> = match var("TABLES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            None => defaults.tables,
        };
        if tables.is_empty() {
            return Err(ConfigError::NoTables);
        }

        let default_limit = parsed("DEFAULT_LIMIT", var("DEFAULT_LIMIT"), DEFAULT_LIMIT)?;
        // 0 disables the ceiling
        let max_limit = parsed("MAX_LIMIT", var("MAX_LIMIT"), MAX_LIMIT)?;
        if default_limit == 0 || (max_limit != 0 && default_limit > max_limit) {
            return Err(ConfigError::InvalidValue {
                key: "DEFAULT_LIMIT",
                value: default_limit.to_string(),
            });
        }
        let timeout_ms: u64 = parsed("QUERY_TIMEOUT_MS", var("QUERY_TIMEOUT_MS"), 5000)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUERY_TIMEOUT_MS",
                value: "0".into(),
            });
        }

        Ok(Settings {
            host: var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT", var("PORT"), defaults.port)?,
            database_url,
            max_connections: parsed("DB_MAX_CONNECTIONS", var("DB_MAX_CONNECTIONS"), defaults.max_connections)?,
            tables,
            limits: QueryLimits {
                default_limit,
                max_limit: (max_limit != 0).then_some(max_limit),
            },
            query_timeout: Duration::from_millis(timeout_ms),
            consistency: parsed("READ_CONSISTENCY", var("READ_CONSISTENCY"), defaults.consistency)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = from(&[]).unwrap();
        assert_eq!(s.port, 3000);
        assert_eq!(s.database_url, "sqlite://./data/db.sqlite");
        assert_eq!(s.tables, vec!["cars", "motorcycles", "boats"]);
        assert_eq!(s.limits.default_limit, 100);
        assert_eq!(s.limits.max_limit, Some(1000));
        assert_eq!(s.query_timeout, Duration::from_secs(5));
        assert_eq!(s.consistency, ReadConsistency::Concurrent);
    }

    #[test]
    fn working_directory_locates_database() {
        let s = from(&[("WORKING_DIRECTORY", "/srv/app/")]).unwrap();
        assert_eq!(s.database_url, "sqlite:///srv/app/data/db.sqlite");
        let s = from(&[("WORKING_DIRECTORY", "/srv/app"), ("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(s.database_url, "sqlite::memory:");
    }

    #[test]
    fn overrides_are_parsed() {
        let s = from(&[
            ("PORT", "8080"),
            ("TABLES", "cars, trucks ,"),
            ("MAX_LIMIT", "0"),
            ("READ_CONSISTENCY", "Snapshot"),
            ("QUERY_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(s.port, 8080);
        assert_eq!(s.tables, vec!["cars", "trucks"]);
        assert_eq!(s.limits.max_limit, None);
        assert_eq!(s.consistency, ReadConsistency::Snapshot);
        assert_eq!(s.query_timeout, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_fail() {
        assert!(matches!(
            from(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        ));
        assert!(matches!(
            from(&[("READ_CONSISTENCY", "eventual")]),
            Err(ConfigError::InvalidValue { key: "READ_CONSISTENCY", .. })
        ));
        assert!(matches!(from(&[("TABLES", " , ")]), Err(ConfigError::NoTables)));
        assert!(matches!(
            from(&[("DEFAULT_LIMIT", "5000")]),
            Err(ConfigError::InvalidValue { key: "DEFAULT_LIMIT", .. })
        ));
    }
}
