//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tidewell_engine::application::fresh_state::MAX_PLAYERS;

use crate::error::AppError;

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Bearer token required on moderator routes.
    pub admin_token: String,
    /// Scheduler period.
    pub tick_interval: Duration,
    /// Number of teams in a fresh game.
    pub player_count: usize,
    /// Content catalog file; the embedded catalog is used when unset.
    pub content_path: Option<PathBuf>,
    /// When set, snapshots go to `PostgreSQL`.
    pub database_url: Option<String>,
    /// Snapshot file used when no database is configured.
    pub snapshot_path: PathBuf,
    /// Write a snapshot during graceful shutdown.
    pub save_on_shutdown: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let admin_token = lookup("ADMIN_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Config("ADMIN_TOKEN environment variable must be set".into()))?;

        let tick_ms: u64 = parse_or(&lookup, "TICK_INTERVAL_MS", 1000)?;
        if tick_ms == 0 {
            return Err(AppError::Config("TICK_INTERVAL_MS must be greater than 0".into()));
        }

        let player_count: usize = parse_or(&lookup, "PLAYER_COUNT", 8)?;
        if player_count == 0 || player_count > MAX_PLAYERS {
            return Err(AppError::Config(format!(
                "PLAYER_COUNT must be between 1 and {MAX_PLAYERS}"
            )));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            admin_token,
            tick_interval: Duration::from_millis(tick_ms),
            player_count,
            content_path: lookup("CONTENT_PATH").map(PathBuf::from),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            snapshot_path: lookup("SNAPSHOT_PATH")
                .map_or_else(|| PathBuf::from("tidewell_snapshot.json"), PathBuf::from),
            save_on_shutdown: parse_or(&lookup, "SAVE_ON_SHUTDOWN", true)?,
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({raw}): {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_token_is_set() {
        // Arrange
        let lookup = lookup_from(&[("ADMIN_TOKEN", "secret")]);

        // Act
        let config = Config::from_lookup(lookup).unwrap();

        // Assert
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.player_count, 8);
        assert_eq!(config.content_path, None);
        assert_eq!(config.database_url, None);
        assert_eq!(config.snapshot_path, PathBuf::from("tidewell_snapshot.json"));
        assert!(config.save_on_shutdown);
    }

    #[test]
    fn test_missing_admin_token_is_config_error() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let lookup = lookup_from(&[
            ("ADMIN_TOKEN", "secret"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("TICK_INTERVAL_MS", "250"),
            ("PLAYER_COUNT", "12"),
            ("CONTENT_PATH", "/etc/tidewell/catalog.yaml"),
            ("DATABASE_URL", "postgres://localhost/tidewell"),
            ("SAVE_ON_SHUTDOWN", "false"),
        ]);

        let config = Config::from_lookup(lookup).unwrap();

        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.player_count, 12);
        assert_eq!(
            config.content_path,
            Some(PathBuf::from("/etc/tidewell/catalog.yaml"))
        );
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/tidewell")
        );
        assert!(!config.save_on_shutdown);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            ("PORT", "seventy"),
            ("PORT", "70000"),
            ("TICK_INTERVAL_MS", "0"),
            ("PLAYER_COUNT", "0"),
            ("PLAYER_COUNT", "257"),
            ("SAVE_ON_SHUTDOWN", "maybe"),
        ] {
            let result = Config::from_lookup(lookup_from(&[("ADMIN_TOKEN", "secret"), (key, value)]));
            assert!(
                matches!(result, Err(AppError::Config(_))),
                "{key}={value} should be rejected"
            );
        }
    }
}
