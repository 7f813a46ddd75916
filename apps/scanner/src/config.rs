use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5678/webhook-test/my-resume-scanner";

const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;
const MAX_SESSION_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECS: u64 = 60 * 60;
const MAX_RESET_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Public origin used to build OAuth callbacks and reset links.
    pub base_url: String,
    pub webhook_url: String,
    /// `None` means the outbound call may hang as long as the upstream does.
    pub webhook_timeout: Option<Duration>,
    pub session: SessionConfig,
    pub google: Option<GoogleConfig>,
    pub demo_user: Option<DemoUser>,
    pub reset_token_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub max_age: Duration,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Credential record seeded into the store at startup.
#[derive(Debug, Clone)]
pub struct DemoUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let webhook_timeout = optional_env("SCAN_WEBHOOK_TIMEOUT_SECS")
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("SCAN_WEBHOOK_TIMEOUT_SECS must be a number of seconds")?
            .map(Duration::from_secs);

        let session = SessionConfig {
            secret: require_env("SESSION_SECRET")?,
            max_age: bounded_secs(
                "SESSION_MAX_AGE_SECS",
                optional_env("SESSION_MAX_AGE_SECS"),
                DEFAULT_SESSION_MAX_AGE_SECS,
                MAX_SESSION_MAX_AGE_SECS,
            )?,
            cookie_secure: optional_env("SESSION_COOKIE_SECURE")
                .map(|s| parse_flag(&s))
                .unwrap_or(false),
        };

        let google = match (
            optional_env("GOOGLE_CLIENT_ID"),
            optional_env("GOOGLE_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_uri: optional_env("GOOGLE_REDIRECT_URI")
                    .unwrap_or_else(|| format!("{base_url}/api/auth/callback/google")),
            }),
            _ => None,
        };

        let demo_user = match (
            optional_env("DEMO_USER_EMAIL"),
            optional_env("DEMO_USER_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(DemoUser {
                name: optional_env("DEMO_USER_NAME").unwrap_or_else(|| "Test User".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        let reset_token_ttl = bounded_secs(
            "RESET_TOKEN_TTL_SECS",
            optional_env("RESET_TOKEN_TTL_SECS"),
            DEFAULT_RESET_TOKEN_TTL_SECS,
            MAX_RESET_TOKEN_TTL_SECS,
        )?;

        Ok(Config {
            port,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            base_url,
            webhook_url: optional_env("SCAN_WEBHOOK_URL")
                .unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string()),
            webhook_timeout,
            session,
            google,
            demo_user,
            reset_token_ttl,
        })
    }

    /// Configuration for router-level tests: no OAuth, no seed, webhook on `webhook_url`.
    #[cfg(test)]
    pub fn for_tests(webhook_url: &str) -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            base_url: "http://localhost:3000".to_string(),
            webhook_url: webhook_url.to_string(),
            webhook_timeout: Some(Duration::from_secs(5)),
            session: SessionConfig {
                secret: "test-secret-key-for-testing".to_string(),
                max_age: Duration::from_secs(3600),
                cookie_secure: false,
            },
            google: None,
            demo_user: None,
            reset_token_ttl: Duration::from_secs(600),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads a variable, treating an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Lifetime in seconds, between 1 and `max`. Larger values would overflow
/// the timestamp arithmetic used for token expiry.
fn bounded_secs(key: &str, raw: Option<String>, default: u64, max: u64) -> Result<Duration> {
    let secs = raw
        .map(|s| s.trim().parse::<u64>())
        .transpose()
        .with_context(|| format!("{key} must be a number of seconds"))?
        .unwrap_or(default);

    if secs == 0 || secs > max {
        anyhow::bail!("{key} must be between 1 and {max} seconds, got {secs}");
    }
    Ok(Duration::from_secs(secs))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
