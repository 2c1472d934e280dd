//! Client configuration.
//!
//! Configuration can be set via environment variables:
//! - `RACHACONTA_API_URL` - Required. Base URL of the RachaConta server.
//! - `RACHACONTA_DATA_DIR` - Optional. Directory for the persisted session. Defaults to the current directory.
//! - `RACHACONTA_HTTP_TIMEOUT_SECS` - Optional. Per-request timeout. Defaults to `30`.
//! - `RACHACONTA_POLL_INTERVAL_SECS` - Optional. Notification poll interval. Defaults to `60`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::cache::EntityClass;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// How long each entity class stays fresh in the query cache.
///
/// Notifications turn over fast; statistics are expensive to recompute
/// server-side and change slowly.
#[derive(Debug, Clone)]
pub struct CacheWindows {
    pub expenses: Duration,
    pub shares: Duration,
    pub debts: Duration,
    pub friendships: Duration,
    pub groups: Duration,
    pub invitations: Duration,
    pub notifications: Duration,
    pub statistics: Duration,
    pub users: Duration,
}

impl Default for CacheWindows {
    fn default() -> Self {
        Self {
            expenses: Duration::from_secs(5 * 60),
            shares: Duration::from_secs(2 * 60),
            debts: Duration::from_secs(5 * 60),
            friendships: Duration::from_secs(5 * 60),
            groups: Duration::from_secs(5 * 60),
            invitations: Duration::from_secs(5 * 60),
            notifications: Duration::from_secs(30),
            statistics: Duration::from_secs(10 * 60),
            users: Duration::from_secs(5 * 60),
        }
    }
}

impl CacheWindows {
    pub fn window_for(&self, class: EntityClass) -> Duration {
        match class {
            EntityClass::Expenses => self.expenses,
            EntityClass::Shares => self.shares,
            EntityClass::Debts => self.debts,
            EntityClass::Friendships => self.friendships,
            EntityClass::Groups => self.groups,
            EntityClass::Invitations => self.invitations,
            EntityClass::Notifications => self.notifications,
            EntityClass::Statistics => self.statistics,
            EntityClass::Users => self.users,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the RachaConta server
    pub base_url: Url,

    /// Directory holding the persisted session file
    pub data_dir: PathBuf,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Interval between notification polls
    pub poll_interval: Duration,

    /// Cache freshness windows
    pub cache: CacheWindows,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `RACHACONTA_API_URL` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("RACHACONTA_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("RACHACONTA_API_URL".to_string()))?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidValue("RACHACONTA_API_URL".to_string(), format!("{}", e))
        })?;

        let data_dir = std::env::var("RACHACONTA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let http_timeout = parse_secs("RACHACONTA_HTTP_TIMEOUT_SECS", 30)?;
        let poll_interval = parse_secs("RACHACONTA_POLL_INTERVAL_SECS", 60)?;

        Ok(Self {
            base_url,
            data_dir,
            http_timeout,
            poll_interval,
            cache: CacheWindows::default(),
        })
    }

    /// Build a configuration directly, without touching the environment.
    pub fn new(base_url: Url, data_dir: PathBuf) -> Self {
        Self {
            base_url,
            data_dir,
            http_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(60),
            cache: CacheWindows::default(),
        }
    }
}

fn parse_secs(var: &str, default: u64) -> Result<Duration, ConfigError> {
    let secs = std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| ConfigError::InvalidValue(var.to_string(), format!("{}", e)))?;
    Ok(Duration::from_secs(secs))
}
