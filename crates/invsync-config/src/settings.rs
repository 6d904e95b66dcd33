//! Connection settings
//!
//! Loaded from `<config dir>/config.yaml` when it exists, then overridden by
//! environment variables:
//!
//! | variable                 | setting         |
//! |--------------------------|-----------------|
//! | `AWX_URL` / `TOWER_HOST` | `url`           |
//! | `AWX_TOKEN`              | `token`         |
//! | `AWX_USERNAME`           | `username`      |
//! | `AWX_PASSWORD`           | `password`      |
//! | `AWX_ORGANIZATION`       | `organization`  |
//! | `INVSYNC_POLL_INTERVAL`  | `poll_interval` |
//! | `AWX_VERIFY_SSL`         | `verify_ssl`    |

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ORGANIZATION: &str = "Default";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How to authenticate against AWX
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::Basic { username, .. } => {
                write!(f, "Basic {{ username: {:?}, password: *** }}", username)
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub organization: String,
    pub poll_interval: Duration,
    pub verify_ssl: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            username: None,
            password: None,
            organization: DEFAULT_ORGANIZATION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            verify_ssl: true,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("organization", &self.organization)
            .field("poll_interval", &self.poll_interval)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

/// `config.yaml` layout
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    url: Option<String>,
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    organization: Option<String>,
    /// humantime string such as `5s`
    poll_interval: Option<String>,
    verify_ssl: Option<bool>,
}

impl Settings {
    /// `config.yaml` from the configuration directory, then the environment
    pub fn load() -> Result<Self> {
        let path = crate::config_dir_path()?.join("config.yaml");
        let mut settings = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        settings.apply_env()?;
        Ok(settings)
    }

    /// Settings from the environment only
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_env()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading settings");
        let content = std::fs::read_to_string(path)?;
        let file: SettingsFile = if content.trim().is_empty() {
            SettingsFile::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        let mut settings = Self::default();
        settings.url = file.url;
        settings.token = file.token;
        settings.username = file.username;
        settings.password = file.password;
        if let Some(org) = file.organization {
            settings.organization = org;
        }
        if let Some(interval) = file.poll_interval {
            settings.poll_interval = parse_interval("poll_interval", &interval)?;
        }
        if let Some(verify) = file.verify_ssl {
            settings.verify_ssl = verify;
        }
        Ok(settings)
    }

    /// Override with whatever environment variables are set
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = env("AWX_URL").or_else(|| env("TOWER_HOST")) {
            self.url = Some(url);
        }
        if let Some(token) = env("AWX_TOKEN") {
            self.token = Some(token);
        }
        if let Some(username) = env("AWX_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = env("AWX_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(org) = env("AWX_ORGANIZATION") {
            self.organization = org;
        }
        if let Some(interval) = env("INVSYNC_POLL_INTERVAL") {
            self.poll_interval = parse_interval("INVSYNC_POLL_INTERVAL", &interval)?;
        }
        if let Some(verify) = env("AWX_VERIFY_SSL") {
            self.verify_ssl = parse_bool("AWX_VERIFY_SSL", &verify)?;
        }
        Ok(())
    }

    pub fn url(&self) -> Result<&str> {
        self.url.as_deref().ok_or(ConfigError::MissingUrl)
    }

    /// A token wins over username/password
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(token) = &self.token {
            return Ok(Credentials::Token(token.clone()));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// A set, non-empty environment variable
fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `"5s"`, `"1m 30s"` or plain seconds
fn parse_interval(key: &str, value: &str) -> Result<Duration> {
    let value = value.trim();
    let interval = match value.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => humantime::parse_duration(value).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?,
    };
    if interval.is_zero() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be positive".to_string(),
        });
    }
    Ok(interval)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const AWX_VARS: [&str; 8] = [
        "AWX_URL",
        "TOWER_HOST",
        "AWX_TOKEN",
        "AWX_USERNAME",
        "AWX_PASSWORD",
        "AWX_ORGANIZATION",
        "INVSYNC_POLL_INTERVAL",
        "AWX_VERIFY_SSL",
    ];

    /// Run `f` with every AWX variable unset except `set`
    fn with_env<T>(set: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let vars: Vec<(&str, Option<&str>)> = AWX_VARS
            .iter()
            .map(|key| {
                let value = set.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(vars, f)
    }

    #[test]
    #[serial]
    fn test_defaults() {
        let settings = with_env(&[], Settings::from_env).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.organization, "Default");
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
        assert!(settings.verify_ssl);
        assert!(matches!(settings.url(), Err(ConfigError::MissingUrl)));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let settings = with_env(
            &[
                ("TOWER_HOST", "https://tower.example.com"),
                ("AWX_USERNAME", "admin"),
                ("AWX_PASSWORD", "password"),
                ("AWX_ORGANIZATION", "Ops"),
                ("INVSYNC_POLL_INTERVAL", "2s"),
                ("AWX_VERIFY_SSL", "false"),
            ],
            Settings::from_env,
        )
        .unwrap();

        assert_eq!(settings.url().unwrap(), "https://tower.example.com");
        assert_eq!(settings.organization, "Ops");
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
        assert!(!settings.verify_ssl);
        assert_eq!(
            settings.credentials().unwrap(),
            Credentials::Basic {
                username: "admin".to_string(),
                password: "password".to_string(),
            }
        );
    }

    #[test]
    #[serial]
    fn test_awx_url_wins_over_tower_host() {
        let settings = with_env(
            &[
                ("AWX_URL", "https://awx.example.com"),
                ("TOWER_HOST", "https://tower.example.com"),
            ],
            Settings::from_env,
        )
        .unwrap();
        assert_eq!(settings.url().unwrap(), "https://awx.example.com");
    }

    #[test]
    fn test_token_wins_over_basic() {
        let settings = Settings {
            token: Some("t".to_string()),
            username: Some("admin".to_string()),
            password: Some("password".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.credentials().unwrap(), Credentials::Token("t".to_string()));

        let settings = Settings {
            username: Some("admin".to_string()),
            ..Settings::default()
        };
        assert!(matches!(
            settings.credentials(),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    #[serial]
    fn test_invalid_env_values() {
        let err = with_env(&[("INVSYNC_POLL_INTERVAL", "often")], Settings::from_env).unwrap_err();
        assert!(err.to_string().contains("INVSYNC_POLL_INTERVAL"));

        let err = with_env(&[("INVSYNC_POLL_INTERVAL", "0")], Settings::from_env).unwrap_err();
        assert!(err.to_string().contains("must be positive"));

        let err = with_env(&[("AWX_VERIFY_SSL", "maybe")], Settings::from_env).unwrap_err();
        assert!(err.to_string().contains("AWX_VERIFY_SSL"));
    }

    #[test]
    #[serial]
    fn test_load_file_then_env() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join("config.yaml"),
            "url: https://awx.example.com\n\
             token: from-file\n\
             organization: Lab\n\
             poll_interval: 10s\n",
        )
        .unwrap();

        let settings = temp_env::with_var(crate::CONFIG_DIR_ENV, Some(temp_dir.path()), || {
            with_env(&[("AWX_TOKEN", "from-env")], Settings::load)
        })
        .unwrap();

        assert_eq!(settings.url().unwrap(), "https://awx.example.com");
        assert_eq!(settings.organization, "Lab");
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert_eq!(
            settings.credentials().unwrap(),
            Credentials::Token("from-env".to_string())
        );
    }

    #[test]
    fn test_file_rejects_unknown_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "url: https://awx.example.com\ntokn: typo\n").unwrap();

        let err = Settings::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(Settings::from_file(&path).unwrap(), Settings::default());
    }
}
