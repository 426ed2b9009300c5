//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use ballotbook_shared::constants::{DEFAULT_HTTP_PORT, RISK_SCORE_THRESHOLD};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./ballotbook.db`
    pub database_path: PathBuf,

    /// JSON seed document imported at startup.
    /// Env: `BALLOTBOOK_SEED_FILE`
    /// Default: unset (no import).
    pub seed_file: Option<PathBuf>,

    /// Sessions scoring above this may not vote.
    /// Env: `RISK_SCORE_THRESHOLD`
    /// Default: `70`
    pub risk_score_threshold: i64,

    /// Sustained requests per second per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    /// Default: `10`
    pub rate_limit_per_sec: f64,

    /// Burst capacity per client IP.
    /// Env: `RATE_LIMIT_BURST`
    /// Default: `30`
    pub rate_limit_burst: f64,

    /// Whether `X-Forwarded-For` names the client. Disable when the server
    /// is reachable without a proxy in front.
    /// Env: `TRUST_FORWARDED_FOR` (true/false)
    /// Default: `true`
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./ballotbook.db"),
            seed_file: None,
            risk_score_threshold: RISK_SCORE_THRESHOLD,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            trust_forwarded_for: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = get("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = get("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = get("BALLOTBOOK_SEED_FILE") {
            if !path.is_empty() {
                config.seed_file = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = get("RISK_SCORE_THRESHOLD") {
            match val.parse::<i64>() {
                Ok(n) => config.risk_score_threshold = n,
                Err(_) => tracing::warn!(value = %val, "Invalid RISK_SCORE_THRESHOLD, using default"),
            }
        }

        if let Some(val) = get("RATE_LIMIT_PER_SEC") {
            match val.parse::<f64>() {
                Ok(n) if n > 0.0 => config.rate_limit_per_sec = n,
                _ => tracing::warn!(value = %val, "Invalid RATE_LIMIT_PER_SEC, using default"),
            }
        }

        if let Some(val) = get("RATE_LIMIT_BURST") {
            match val.parse::<f64>() {
                Ok(n) if n >= 1.0 => config.rate_limit_burst = n,
                _ => tracing::warn!(value = %val, "Invalid RATE_LIMIT_BURST, using default"),
            }
        }

        if let Some(val) = get("TRUST_FORWARDED_FOR") {
            config.trust_forwarded_for = val != "false" && val != "0";
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.risk_score_threshold, 70);
        assert!(config.seed_file.is_none());
        assert!(config.trust_forwarded_for);
    }

    #[test]
    fn test_env_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/var/lib/ballotbook/ballots.db"),
            ("BALLOTBOOK_SEED_FILE", "/etc/ballotbook/seed.json"),
            ("RISK_SCORE_THRESHOLD", "50"),
            ("TRUST_FORWARDED_FOR", "false"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/ballotbook/ballots.db")
        );
        assert_eq!(
            config.seed_file,
            Some(PathBuf::from("/etc/ballotbook/seed.json"))
        );
        assert_eq!(config.risk_score_threshold, 50);
        assert!(!config.trust_forwarded_for);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("RISK_SCORE_THRESHOLD", "high"),
            ("RATE_LIMIT_BURST", "0"),
            ("BALLOTBOOK_SEED_FILE", ""),
        ]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.risk_score_threshold, 70);
        assert_eq!(config.rate_limit_burst, 30.0);
        assert!(config.seed_file.is_none());
    }
}
