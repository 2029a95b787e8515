//! CLI subcommands and the state they share.

pub mod auth;
pub mod catalog;
pub mod init;
pub mod live;
pub mod sessions;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use recall_client::config::{build_session, load_config_from};
use recall_client::{ApiClient, Outcome, RecallConfig};
use recall_core::{guard, Decision, NotificationSink, Route, Session};

/// Everything a command needs: config, session, notifications, client.
pub struct App {
    pub config: RecallConfig,
    pub session: Arc<Session>,
    pub notifications: Arc<NotificationSink>,
    pub client: ApiClient,
}

impl App {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        tracing::debug!(?config, "configuration loaded");

        let session = build_session(&config)?;
        let notifications = Arc::new(NotificationSink::new());
        let client =
            ApiClient::with_user_agent(session.clone(), notifications.clone(), &config.user_agent)
                .context("failed to create API client")?;

        Ok(Self {
            config,
            session,
            notifications,
            client,
        })
    }

    /// Consult the navigation guard before showing `target`.
    pub fn navigate(&self, target: &Route) -> Result<()> {
        match guard(&self.session, target) {
            Decision::Allow => Ok(()),
            Decision::Redirect(Route::Login) => {
                anyhow::bail!("not logged in, run `recall login` first")
            }
            Decision::Redirect(Route::Main) => {
                anyhow::bail!("already logged in, run `recall logout` to switch accounts")
            }
            Decision::Redirect(other) => anyhow::bail!("redirected to {other}"),
        }
    }

    /// Unwrap a handled outcome; the refusal itself was already reported.
    pub fn settle<T>(&self, outcome: Outcome<T>) -> Result<T> {
        outcome.into_result().map_err(anyhow::Error::from)
    }

    /// Print and clear pending notifications.
    pub fn render_notifications(&self) {
        for n in self.notifications.drain() {
            eprintln!("[{}] {}", n.level, n.message);
        }
    }

    /// Tell the user their session expired. Returns whether it did.
    pub fn report_expiry(&self) -> bool {
        if self.session.expiry_count() == 0 {
            return false;
        }
        eprintln!("Session expired, run `recall login` to sign in again.");
        true
    }
}
