//! Configuration module for the intake backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Decision service consulted by the donation redirect.
pub const DEFAULT_DONATE_GO_URL: &str =
    "https://asjhkidpuhqodryczuth.functions.supabase.co/donate-go";

/// Donation page used whenever the decision service cannot answer in time.
pub const DEFAULT_DONATE_FALLBACK_URL: &str = "https://givebutter.com/valorwellhelp";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for the admin read API (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Redirect decision service endpoint
    pub donate_go_url: String,
    /// Destination when the decision service fails or is too slow
    pub donate_fallback_url: String,
    /// How long the redirect waits for the decision service
    pub redirect_timeout: Duration,
    /// Idle time after which an open wizard session is dropped
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("INTAKE_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("INTAKE_DB_PATH")
            .unwrap_or_else(|_| "./data/intake.sqlite".to_string())
            .into();

        let bind_addr = parse_var("INTAKE_BIND_ADDR", "127.0.0.1:8080")?;

        let log_level = env::var("INTAKE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = match env::var("INTAKE_LOG_FORMAT") {
            Ok(format) if format.eq_ignore_ascii_case("json") => true,
            Ok(format) if format.is_empty() || format.eq_ignore_ascii_case("text") => false,
            Ok(format) => {
                return Err(ConfigError::Invalid {
                    name: "INTAKE_LOG_FORMAT",
                    value: format,
                })
            }
            Err(_) => false,
        };

        let donate_go_url =
            env::var("INTAKE_DONATE_GO_URL").unwrap_or_else(|_| DEFAULT_DONATE_GO_URL.to_string());

        let donate_fallback_url = env::var("INTAKE_DONATE_FALLBACK_URL")
            .unwrap_or_else(|_| DEFAULT_DONATE_FALLBACK_URL.to_string());

        let redirect_timeout =
            Duration::from_millis(parse_var("INTAKE_REDIRECT_TIMEOUT_MS", "4000")?);

        let session_ttl = Duration::from_secs(parse_var("INTAKE_SESSION_TTL_SECS", "3600")?);

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            log_json,
            donate_go_url,
            donate_fallback_url,
            redirect_timeout,
            session_ttl,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "INTAKE_API_PSK",
        "INTAKE_DB_PATH",
        "INTAKE_BIND_ADDR",
        "INTAKE_LOG_LEVEL",
        "INTAKE_LOG_FORMAT",
        "INTAKE_DONATE_GO_URL",
        "INTAKE_DONATE_FALLBACK_URL",
        "INTAKE_REDIRECT_TIMEOUT_MS",
        "INTAKE_SESSION_TTL_SECS",
    ];

    // Both cases live in one test so they never race on the process environment.
    #[test]
    fn test_defaults_and_invalid_values() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/intake.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.donate_fallback_url, DEFAULT_DONATE_FALLBACK_URL);
        assert_eq!(config.redirect_timeout, Duration::from_millis(4000));
        assert_eq!(config.session_ttl, Duration::from_secs(3600));

        env::set_var("INTAKE_REDIRECT_TIMEOUT_MS", "soon");
        let err = Config::from_env().unwrap_err();
        env::remove_var("INTAKE_REDIRECT_TIMEOUT_MS");

        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "INTAKE_REDIRECT_TIMEOUT_MS",
                ..
            }
        ));
    }
}
