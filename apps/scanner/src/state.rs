use std::sync::Arc;

use anyhow::{Context, Result};

use crate::auth::oauth::GoogleOAuthService;
use crate::auth::recovery::RecoveryService;
use crate::auth::store::{CredentialStore, InMemoryUserStore};
use crate::auth::SessionService;
use crate::config::Config;
use crate::pages::Pages;
use crate::scan::client::WebhookClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Credential store. In-memory for now; contents are lost on restart.
    pub users: Arc<dyn CredentialStore>,
    pub sessions: Arc<SessionService>,
    pub recovery: Arc<RecoveryService>,
    pub scanner: WebhookClient,
    /// `None` when the Google client id/secret are not configured.
    pub google: Option<Arc<GoogleOAuthService>>,
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let scanner = WebhookClient::new(config.webhook_url.clone(), config.webhook_timeout)?;
        let pages = Pages::new().context("Failed to register page templates")?;

        Ok(Self {
            users: Arc::new(InMemoryUserStore::new()),
            sessions: Arc::new(SessionService::new(config.session.clone())),
            recovery: Arc::new(RecoveryService::new(config.reset_token_ttl)),
            scanner,
            google: config
                .google
                .as_ref()
                .map(|g| Arc::new(GoogleOAuthService::new(g))),
            pages: Arc::new(pages),
            config,
        })
    }

    /// Swaps in a Google client, e.g. one pointed at a local mock provider.
    #[cfg(test)]
    pub fn with_google(mut self, google: GoogleOAuthService) -> Self {
        self.google = Some(Arc::new(google));
        self
    }
}
