use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Production backend.
pub const DEFAULT_API_URL: &str = "https://iicgp-backend-cms.onrender.com";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub api_url: String,
    /// Per-request timeout. `None` keeps the HTTP client's default.
    pub request_timeout: Option<Duration>,
    /// Where the bearer token is persisted between runs.
    pub token_file: PathBuf,
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with defaults for everything else.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_url(api_url.into()),
            request_timeout: None,
            token_file: default_token_file(),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                                  |
    /// |------------------------------|------------------------------------------|
    /// | `IICGP_API_URL`              | `https://iicgp-backend-cms.onrender.com` |
    /// | `IICGP_REQUEST_TIMEOUT_SECS` | unset (HTTP client default)              |
    /// | `IICGP_TOKEN_FILE`           | `$HOME/.iicgp/token`                     |
    pub fn from_env() -> ClientResult<Self> {
        let api_url = std::env::var("IICGP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "IICGP_API_URL must be an http(s) URL, got '{api_url}'"
            )));
        }

        let request_timeout = match std::env::var("IICGP_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ClientError::Config(format!(
                        "IICGP_REQUEST_TIMEOUT_SECS must be a valid u64, got '{raw}'"
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        let token_file = std::env::var("IICGP_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_token_file());

        Ok(Self {
            api_url: normalize_url(api_url),
            request_timeout,
            token_file,
        })
    }
}

fn normalize_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn default_token_file() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".iicgp")
        .join("token")
}
