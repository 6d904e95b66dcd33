//! Connection settings for [`AwxClient`](crate::AwxClient)

use crate::error::{AwxError, Result};
use std::fmt;
use std::time::Duration;

/// Per-request timeout used when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How requests authenticate
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// OAuth2 / personal access token, sent as `Authorization: Bearer`
    Token(String),
    Basic { username: String, password: String },
}

// Keep secrets out of logs
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Token(_) => f.write_str("Token(***)"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AwxConfig {
    /// Base URL, e.g. `https://awx.example.com`
    pub base_url: String,
    pub auth: Auth,
    /// Verify the server's TLS certificate
    pub verify_ssl: bool,
    pub request_timeout: Duration,
}

impl AwxConfig {
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            verify_ssl: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Base URL without trailing slashes, rejecting anything that is not http(s)
    pub(crate) fn normalized_base_url(&self) -> Result<String> {
        let url = self.base_url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(AwxError::InvalidConfig("AWX URL is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AwxError::InvalidConfig(format!(
                "AWX URL must start with http:// or https://: {}",
                url
            )));
        }
        Ok(url.to_string())
    }
}
