//! Configuration
//!
//! Read once at startup: environment variables first, then the optional
//! `~/.gsweep/config.json`. Secrets are never printed by `Debug`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::common::config_path;

pub const ENV_CLIENT_ID: &str = "GSWEEP_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GSWEEP_CLIENT_SECRET";
pub const ENV_API_KEY: &str = "GSWEEP_API_KEY";
pub const ENV_DEV: &str = "GSWEEP_DEV";
pub const ENV_REDIRECT_URI: &str = "GSWEEP_REDIRECT_URI";

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8765";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("redirect URI must be https or a loopback http address: {0}")]
    InvalidRedirect(String),
}

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_key: Option<String>,
    pub dev_mode: Option<bool>,
    pub redirect_uri: Option<String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub api_key: Option<String>,
    /// Full error detail goes to the debug log
    pub dev_mode: bool,
    pub redirect_uri: String,
}

impl Config {
    /// Load from the process environment and the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Reading config file");
                FileConfig::read(&path)?
            }
            _ => FileConfig::default(),
        };
        Self::from_sources(|key| std::env::var(key).ok(), file)
    }

    /// Merge `env` over `file`. Blank values count as unset.
    pub fn from_sources<E>(env: E, file: FileConfig) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: Option<String>| {
            env(key)
                .or(fallback)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let client_id = pick(ENV_CLIENT_ID, file.client_id).ok_or(ConfigError::Missing(ENV_CLIENT_ID))?;
        let dev_mode = match env(ENV_DEV) {
            Some(v) => parse_flag(&v),
            None => file.dev_mode.unwrap_or(false),
        };
        let redirect_uri = pick(ENV_REDIRECT_URI, file.redirect_uri)
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        if !is_acceptable_redirect(&redirect_uri) {
            return Err(ConfigError::InvalidRedirect(redirect_uri));
        }

        Ok(Self {
            client_id,
            client_secret: pick(ENV_CLIENT_SECRET, file.client_secret),
            api_key: pick(ENV_API_KEY, file.api_key),
            dev_mode,
            redirect_uri,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("api_key", &redact(&self.api_key))
            .field("dev_mode", &self.dev_mode)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn is_acceptable_redirect(uri: &str) -> bool {
    let Ok(parsed) = url::Url::parse(uri) else {
        return false;
    };
    match parsed.scheme() {
        "https" => parsed.host_str().is_some(),
        "http" => matches!(parsed.host_str(), Some("127.0.0.1") | Some("localhost") | Some("[::1]")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_file() {
        let file = FileConfig {
            client_id: Some("file-id".into()),
            api_key: Some("file-key".into()),
            dev_mode: Some(true),
            ..Default::default()
        };
        let config = Config::from_sources(
            env(&[(ENV_CLIENT_ID, "env-id"), (ENV_DEV, "0")]),
            file,
        )
        .unwrap();

        assert_eq!(config.client_id, "env-id");
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert!(!config.dev_mode);
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
    }

    #[test]
    fn missing_client_id_is_an_error() {
        let err = Config::from_sources(env(&[(ENV_CLIENT_ID, "   ")]), FileConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_CLIENT_ID)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = Config::from_sources(
            env(&[(ENV_CLIENT_ID, "id"), (ENV_API_KEY, "AIzaSecret"), (ENV_CLIENT_SECRET, "shh")]),
            FileConfig::default(),
        )
        .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("AIzaSecret"));
        assert!(!printed.contains("shh"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn redirect_must_be_loopback_or_https() {
        for bad in ["http://example.com/cb", "ftp://127.0.0.1", "not a url"] {
            let err = Config::from_sources(
                env(&[(ENV_CLIENT_ID, "id"), (ENV_REDIRECT_URI, bad)]),
                FileConfig::default(),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRedirect(_)));
        }
        let ok = Config::from_sources(
            env(&[(ENV_CLIENT_ID, "id"), (ENV_REDIRECT_URI, "http://localhost:9000/cb")]),
            FileConfig::default(),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn file_config_uses_camel_case() {
        let file: FileConfig =
            serde_json::from_str(r#"{"clientId": "abc", "devMode": true}"#).unwrap();
        assert_eq!(file.client_id.as_deref(), Some("abc"));
        assert_eq!(file.dev_mode, Some(true));
    }
}
