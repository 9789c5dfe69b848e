use dotenv::dotenv;
use dotenv::from_path;
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_DATABASE_PATH: &str = "alumni_link.db";
pub const DEFAULT_LOG_FILTER: &str =
    "api_server=debug,application=info,domain=info,infrastructure=info,tower_http=debug";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load .env file from path {path}: {reason}")]
    EnvFile { path: String, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: String,
    pub api_host: String,
    pub api_port: u16,
    /// Base URL of the email callables. `None` logs emails instead.
    pub email_functions_url: Option<String>,
    pub email_timeout: Duration,
    pub max_failed_logins: u32,
    pub login_lockout: Duration,
    /// How long a bearer session stays valid after login.
    pub session_ttl: Duration,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            email_functions_url: None,
            email_timeout: Duration::from_secs(10),
            max_failed_logins: 5,
            login_lockout: Duration::from_secs(300),
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a specified `.env` file path or default to the root `.env` file.
    /// Real environment variables win over the file.
    pub fn from_env(env_path: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(path) = env_path {
            from_path(path).map_err(|e| ConfigError::EnvFile {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        } else {
            // A missing `.env` is fine.
            dotenv().ok();
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let email_functions_url = match get("EMAIL_FUNCTIONS_URL") {
            Some(raw) => {
                Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
                    key: "EMAIL_FUNCTIONS_URL",
                    reason: e.to_string(),
                })?;
                Some(raw)
            }
            None => None,
        };

        Ok(Self {
            database_path: get("DATABASE_PATH").unwrap_or(defaults.database_path),
            api_host: get("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_or("API_PORT", get("API_PORT"), defaults.api_port)?,
            email_functions_url,
            email_timeout: Duration::from_secs(parse_or(
                "EMAIL_TIMEOUT_SECONDS",
                get("EMAIL_TIMEOUT_SECONDS"),
                defaults.email_timeout.as_secs(),
            )?),
            max_failed_logins: parse_or(
                "MAX_FAILED_LOGINS",
                get("MAX_FAILED_LOGINS"),
                defaults.max_failed_logins,
            )?,
            login_lockout: Duration::from_secs(parse_or(
                "LOGIN_LOCKOUT_SECONDS",
                get("LOGIN_LOCKOUT_SECONDS"),
                defaults.login_lockout.as_secs(),
            )?),
            session_ttl: Duration::from_secs(parse_or(
                "SESSION_TTL_SECONDS",
                get("SESSION_TTL_SECONDS"),
                defaults.session_ttl.as_secs(),
            )?),
            log_filter: get("LOG_FILTER").unwrap_or(defaults.log_filter),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
