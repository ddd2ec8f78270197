//! Client configuration: explicit values, then environment, then TOML files, then defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::QueryError;

const DEFAULT_USER_AGENT: &str = concat!("objquery/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    pub app_id: String,
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub master_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<String>| s.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("server_url", &self.server_url)
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .field("master_key", &redact(&self.master_key))
            .field("session_token", &redact(&self.session_token))
            .field("timeout_ms", &self.timeout_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Every field optional; layers are merged fill-if-missing in precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialConfig {
    pub server_url: Option<String>,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub master_key: Option<String>,
    pub session_token: Option<String>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

impl PartialConfig {
    fn fill_from(&mut self, other: PartialConfig) {
        macro_rules! fill {
            ($($f:ident),*) => { $( if self.$f.is_none() { self.$f = other.$f; } )* };
        }
        fill!(server_url, app_id, app_key, master_key, session_token, timeout_ms, user_agent);
    }

    /// Read `OBJQUERY_*` variables.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |k: &str| std::env::var(k).ok().filter(|s| !s.is_empty());
        Self {
            server_url: var("OBJQUERY_SERVER_URL"),
            app_id: var("OBJQUERY_APP_ID"),
            app_key: var("OBJQUERY_APP_KEY"),
            master_key: var("OBJQUERY_MASTER_KEY"),
            session_token: var("OBJQUERY_SESSION_TOKEN"),
            timeout_ms: var("OBJQUERY_TIMEOUT_MS").and_then(|s| s.parse().ok()),
            user_agent: var("OBJQUERY_USER_AGENT"),
        }
    }

    /// # Errors
    /// Returns `Io` if the file cannot be read and `Config` if it is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, QueryError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Io(format!("{}: {e}", path.display())))?;
        toml::from_str(&s).map_err(|e| QueryError::Config(format!("{}: {e}", path.display())))
    }

    #[must_use]
    pub fn into_config(self) -> ClientConfig {
        ClientConfig {
            server_url: self.server_url.unwrap_or_default(),
            app_id: self.app_id.unwrap_or_default(),
            app_key: self.app_key.unwrap_or_default(),
            master_key: self.master_key,
            session_token: self.session_token,
            timeout_ms: self.timeout_ms,
            user_agent: self.user_agent,
        }
    }
}

/// Candidate config files, highest precedence first.
#[must_use]
pub fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var("OBJQUERY_CONFIG") {
        paths.push(PathBuf::from(p));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("objquery.toml"));
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        paths.push(PathBuf::from(home).join(".config").join("objquery.toml"));
    }
    paths
}

impl ClientConfig {
    /// Resolve `explicit` over the environment over config files.
    ///
    /// # Errors
    /// Propagates unreadable or malformed config files and validation failures.
    pub fn load(explicit: PartialConfig, config_file: Option<&Path>) -> Result<Self, QueryError> {
        let mut merged = explicit;
        merged.fill_from(PartialConfig::from_env());
        for p in config_paths(config_file) {
            if p.exists() {
                log::debug!("reading config file {}", p.display());
                merged.fill_from(PartialConfig::from_file(&p)?);
            }
        }
        let cfg = merged.into_config();
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// `Config` when the server URL is not absolute http(s) or the app id is empty.
    pub fn validate(&self) -> Result<(), QueryError> {
        let url = url::Url::parse(&self.server_url)
            .map_err(|e| QueryError::Config(format!("invalid server_url {:?}: {e}", self.server_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(QueryError::Config(format!("unsupported scheme {}", url.scheme())));
        }
        if self.app_id.is_empty() {
            return Err(QueryError::Config("app_id must not be empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}
