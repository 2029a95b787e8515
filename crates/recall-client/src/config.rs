//! Client configuration and session wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use recall_core::{FileTokenStore, Session};

use crate::client::DEFAULT_USER_AGENT;

/// Top-level recall configuration.
///
/// Note: Custom Debug impl masks the Telegram payload, which is a credential.
#[derive(Clone, Serialize, Deserialize)]
pub struct RecallConfig {
    /// Base URL of the API, without the `/api` suffix.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Where the bearer token is kept between runs.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    /// Signed Telegram Mini-App init data. When set, it replaces the token.
    #[serde(default)]
    pub telegram_init_data: Option<String>,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl std::fmt::Debug for RecallConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecallConfig")
            .field("api_url", &self.api_url)
            .field("token_path", &self.token_path)
            .field(
                "telegram_init_data",
                &self.telegram_init_data.as_ref().map(|_| "***"),
            )
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_token_path() -> PathBuf {
    dirs_path()
        .map(|d| d.join("token"))
        .unwrap_or_else(|| PathBuf::from(".recall-token"))
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_path: default_token_path(),
            telegram_init_data: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Replace `${VAR}` references with values from the environment.
///
/// Single forward pass: substituted values are copied through untouched, so a
/// value that itself contains `${...}` is never expanded again. Unset
/// variables become empty; an unterminated `${` is kept as-is.
fn resolve_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + 2 + len];
        out.push_str(&std::env::var(name).unwrap_or_default());
        rest = &rest[start + 2 + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Expand a leading `~/` to `$HOME`.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

fn resolve_config(config: RecallConfig) -> RecallConfig {
    RecallConfig {
        api_url: resolve_env_vars(&config.api_url),
        token_path: expand_home(&resolve_env_vars(&config.token_path.to_string_lossy())),
        telegram_init_data: config
            .telegram_init_data
            .map(|d| resolve_env_vars(&d))
            .filter(|d| !d.trim().is_empty()),
        user_agent: config.user_agent,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `recall.toml` in the current directory
/// 2. `~/.config/recall/config.toml`
///
/// Environment variable overrides: `RECALL_API_URL`, `RECALL_TOKEN_PATH`,
/// `RECALL_TELEGRAM_INIT_DATA`.
pub fn load_config() -> Result<RecallConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RecallConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("recall.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<RecallConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RecallConfig::default(),
    };

    // Apply env var overrides
    if let Ok(url) = std::env::var("RECALL_API_URL") {
        config.api_url = url;
    }
    if let Ok(token_path) = std::env::var("RECALL_TOKEN_PATH") {
        config.token_path = PathBuf::from(token_path);
    }
    if let Ok(init_data) = std::env::var("RECALL_TELEGRAM_INIT_DATA") {
        config.telegram_init_data = Some(init_data);
    }

    Ok(resolve_config(config))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("recall"))
}

/// Build the session for this configuration, backed by the token file.
pub fn build_session(config: &RecallConfig) -> Result<Arc<Session>> {
    let store = FileTokenStore::new(&config.token_path);
    let session = Session::new(store, config.telegram_init_data.clone(), &config.api_url)
        .context("failed to initialize session")?;
    Ok(Arc::new(session))
}
