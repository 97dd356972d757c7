use std::env;
use thiserror::Error;

/// Session lifetime applied when `SESSION_LIFETIME_SECS` is not set.
pub const DEFAULT_SESSION_LIFETIME_SECS: u64 = 3600;
pub const DEFAULT_COOKIE_NAME: &str = "itemsauth";
const LOCAL_SESSION_SECRET: &str = "local-dev-session-secret-change-me";
const LOCAL_DATABASE_URL: &str = "sqlite://./items.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// ConfigError
///
/// Raised by [`AppConfig::load`] when a required variable is missing or unparsable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// AppConfig
///
/// Process-wide configuration. Loaded once at startup and never mutated; handlers reach
/// it through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Storage connection string (SQLite URL).
    pub db_url: String,
    // Runtime environment marker. Controls log format and the cookie `Secure` flag.
    pub env: Env,
    // HMAC secret used to sign and verify session tokens.
    pub session_secret: String,
    pub session_lifetime_secs: u64,
    pub cookie_name: String,
    pub bind_addr: String,
    // Optional bootstrap account, created at startup if absent.
    pub first_superuser: Option<SuperuserSeed>,
}

/// Credentials for the superuser seeded at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct SuperuserSeed {
    pub email: String,
    pub password: String,
}

/// Env
///
/// Runtime context: `Local` gets pretty logs and non-`Secure` cookies for plain-HTTP
/// development, `Production` gets JSON logs and mandatory secrets.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for tests: in-memory database, fixed secret.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            env: Env::Local,
            session_secret: "super-secure-test-secret-value-local".to_string(),
            session_lifetime_secs: DEFAULT_SESSION_LIFETIME_SECS,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            first_superuser: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every setting from the environment. In production, `DATABASE_URL` and
    /// `SESSION_SECRET` are mandatory; locally they fall back to development defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let (db_url, session_secret) = match env {
            Env::Production => (
                env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
                env::var("SESSION_SECRET").map_err(|_| ConfigError::Missing("SESSION_SECRET"))?,
            ),
            Env::Local => (
                env::var("DATABASE_URL").unwrap_or_else(|_| LOCAL_DATABASE_URL.to_string()),
                env::var("SESSION_SECRET").unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string()),
            ),
        };

        let session_lifetime_secs = match env::var("SESSION_LIFETIME_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "SESSION_LIFETIME_SECS",
                value: raw,
            })?,
            Err(_) => DEFAULT_SESSION_LIFETIME_SECS,
        };

        let first_superuser = match (
            env::var("FIRST_SUPERUSER_EMAIL"),
            env::var("FIRST_SUPERUSER_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(SuperuserSeed { email, password }),
            _ => None,
        };

        Ok(Self {
            db_url,
            env,
            session_secret,
            session_lifetime_secs,
            cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| DEFAULT_COOKIE_NAME.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            first_superuser,
        })
    }
}
