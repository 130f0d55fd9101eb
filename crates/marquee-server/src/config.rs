//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "marquee_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> String {
    "movies.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    marquee_db::DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    marquee_db::DbRuntimeSettings::default().pool_max_size
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl DatabaseConfig {
    /// Pool tunables derived from this section.
    pub fn runtime_settings(&self) -> marquee_db::DbRuntimeSettings {
        marquee_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides (see [`apply_env_overrides`]).
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides looked up through `var`:
///
/// - `MARQUEE_HOST` overrides `server.host`
/// - `MARQUEE_PORT` overrides `server.port`
/// - `MARQUEE_DB_PATH` overrides `database.path`
/// - `MARQUEE_DB_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `MARQUEE_DB_POOL_MAX_SIZE` overrides `database.pool_max_size`
/// - `MARQUEE_LOG_LEVEL` overrides `logging.level`
/// - `MARQUEE_LOG_JSON` overrides `logging.json` (set to "true" or "1")
///
/// Values that fail to parse are ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = var("MARQUEE_HOST") {
        parse_into(&mut config.server.host, "MARQUEE_HOST", &host);
    }
    if let Some(port) = var("MARQUEE_PORT") {
        parse_into(&mut config.server.port, "MARQUEE_PORT", &port);
    }
    if let Some(db_path) = var("MARQUEE_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(timeout) = var("MARQUEE_DB_BUSY_TIMEOUT_MS") {
        parse_into(
            &mut config.database.busy_timeout_ms,
            "MARQUEE_DB_BUSY_TIMEOUT_MS",
            &timeout,
        );
    }
    if let Some(size) = var("MARQUEE_DB_POOL_MAX_SIZE") {
        parse_into(
            &mut config.database.pool_max_size,
            "MARQUEE_DB_POOL_MAX_SIZE",
            &size,
        );
    }
    if let Some(level) = var("MARQUEE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("MARQUEE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}

fn parse_into<T: std::str::FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.trim().parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => {
            tracing::warn!(key, value = raw, "ignoring unparseable environment override")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.path, "movies.db");
        assert_eq!(config.database.pool_max_size, 8);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9090

            [database]
            path = "/var/lib/marquee/movies.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.database.path, "/var/lib/marquee/movies.db");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert!(!config.logging.json);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = load_config(path.to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("MARQUEE_HOST", "0.0.0.0"),
                ("MARQUEE_PORT", "8080"),
                ("MARQUEE_DB_PATH", "/tmp/x.db"),
                ("MARQUEE_DB_POOL_MAX_SIZE", "2"),
                ("MARQUEE_LOG_JSON", "1"),
            ]),
        );

        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "/tmp/x.db");
        assert_eq!(config.database.pool_max_size, 2);
        assert!(config.logging.json);
    }

    #[test]
    fn unparseable_env_override_is_ignored() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[("MARQUEE_PORT", "eighty"), ("MARQUEE_DB_BUSY_TIMEOUT_MS", "-1")]),
        );

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
    }
}
