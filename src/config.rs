//! Configuration from environment variables and command-line flags
//!
//! Everything the pipeline needs is carried in `FetchConfig` and passed in
//! explicitly; nothing here is read again once the pipeline starts.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.hackerone.com/v1/hackers/hacktivity";

#[derive(Debug, Clone, PartialEq)]
pub enum BackendType {
    Jsonl,
    Sqlite,
}

/// Opaque API credential pair
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub credentials: Credentials,
    pub api_url: String,
    pub page_size: u32,
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub max_retries: u32,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl FetchConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `H1_USERNAME`, `H1_API_TOKEN` (required)
    /// - `H1_API_URL` (default: hacktivity endpoint)
    /// - `H1_PAGE_SIZE` (default: 100)
    /// - `H1_MAX_PAGES` (default: 100)
    /// - `H1_REQUEST_TIMEOUT_SECS` (default: 30)
    /// - `PAYOUT_OUTPUT_DIR` (default: logs)
    /// - `PAYOUT_WORKERS` (default: 3)
    /// - `PAYOUT_MAX_RETRIES` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        let username = required("H1_USERNAME")?;
        let token = required("H1_API_TOKEN")?;

        let api_url = env::var("H1_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "H1_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let page_size = parsed_or("H1_PAGE_SIZE", 100u32);
        if page_size == 0 {
            return Err(ConfigError::InvalidValue("H1_PAGE_SIZE must be positive".to_string()));
        }

        Ok(Self {
            credentials: Credentials::new(username, token),
            api_url,
            page_size,
            max_pages: parsed_or("H1_MAX_PAGES", 100),
            request_timeout: Duration::from_secs(parsed_or("H1_REQUEST_TIMEOUT_SECS", 30)),
            output_dir: env::var("PAYOUT_OUTPUT_DIR")
                .unwrap_or_else(|_| "logs".to_string())
                .into(),
            workers: parsed_or("PAYOUT_WORKERS", 3usize).max(1),
            max_retries: parsed_or("PAYOUT_MAX_RETRIES", 3),
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(name.to_string()))
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Value following `--flag` on the command line
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

pub fn parse_backend_from_args(args: &[String]) -> BackendType {
    match arg_value(args, "--backend").as_deref() {
        Some("sqlite") => BackendType::Sqlite,
        Some("jsonl") => BackendType::Jsonl,
        Some(other) => {
            log::warn!("Unknown --backend '{}', defaulting to jsonl", other);
            BackendType::Jsonl
        }
        None => BackendType::Jsonl,
    }
}
