//! Google sign-in (authorization code flow).
//!
//! The provider verifies the user; the app trusts the returned profile and
//! mints a session from it without consulting the credential store.

use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use url::Url;

use crate::auth::session::SessionIdentity;
use crate::config::GoogleConfig;

pub const OAUTH_STATE_COOKIE: &str = "scanner_oauth_state";

/// Provider endpoints. Overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token: "https://oauth2.googleapis.com/token".to_string(),
            userinfo: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        }
    }
}

/// Profile returned by the provider after a successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthUserInfo {
    pub provider_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<OAuthUserInfo> for SessionIdentity {
    fn from(info: OAuthUserInfo) -> Self {
        SessionIdentity::new(info.provider_id, info.email, info.name)
    }
}

pub struct GoogleOAuthService {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: GoogleEndpoints,
}

impl GoogleOAuthService {
    pub fn new(config: &GoogleConfig) -> Self {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(config: &GoogleConfig, endpoints: GoogleEndpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            endpoints,
        }
    }

    /// URL the browser is sent to, carrying `state` for the callback check.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.endpoints.authorize,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .context("Invalid authorization endpoint")?;
        Ok(url.into())
    }

    /// Exchanges the callback code for a token, then fetches the profile.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthUserInfo> {
        let token: GoogleTokenResponse = self
            .client
            .post(&self.endpoints.token)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Failed to exchange code")?
            .error_for_status()
            .context("Token endpoint rejected the code")?
            .json()
            .await
            .context("Failed to parse token response")?;

        let profile: GoogleUserInfo = self
            .client
            .get(&self.endpoints.userinfo)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("Failed to fetch user info")?
            .error_for_status()
            .context("User info endpoint rejected the token")?
            .json()
            .await
            .context("Failed to parse user info")?;

        Ok(OAuthUserInfo {
            provider_id: profile.sub,
            email: profile.email,
            name: profile.name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

/// Random value bound to the browser via a short-lived cookie (32 hex chars).
pub fn generate_state() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}
