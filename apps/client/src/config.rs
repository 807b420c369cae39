use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Client configuration loaded from environment variables.
/// Every variable has a default except the CLI bearer token.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub id_token: Option<String>,
    pub user_id: String,
    pub request_timeout: Duration,
    pub profile_poll_interval: Duration,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            id_token: None,
            user_id: "local".to_string(),
            request_timeout: Duration::from_secs(120),
            profile_poll_interval: Duration::from_secs(30),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_url: std::env::var("RECRUIT_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            id_token: optional_env("RECRUIT_ID_TOKEN"),
            user_id: std::env::var("RECRUIT_USER_ID").unwrap_or_else(|_| "local".to_string()),
            request_timeout: seconds_env("RECRUIT_REQUEST_TIMEOUT_SECS", 120)?,
            profile_poll_interval: seconds_env("RECRUIT_PROFILE_POLL_SECS", 30)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn seconds_env(key: &str, default: u64) -> Result<Duration> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{key} must be a whole number of seconds")),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
