//! Session issuer. Signs and validates the identity token carried in the
//! session cookie.
//!
//! Tokens are HS256 JWTs. The claim set is fixed to `{sub, email, name}` plus
//! `iat`/`exp`; `email` and `name` may be absent (an OAuth profile without a
//! display name, for instance) and readers render them as unknown.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::models::user::UserRecord;

pub const SESSION_COOKIE: &str = "scanner_session";

const UNKNOWN: &str = "N/A";
const GUEST_NAME: &str = "Guest User";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign session token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// The identity fields every session reader works with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionIdentity {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl SessionIdentity {
    pub fn new(id: impl Into<String>, email: Option<String>, name: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            email,
            name,
        }
    }

    pub fn id_or_unknown(&self) -> &str {
        non_empty(&self.id).unwrap_or(UNKNOWN)
    }

    pub fn email_or_unknown(&self) -> &str {
        non_empty(&self.email).unwrap_or(UNKNOWN)
    }

    pub fn name_or_unknown(&self) -> &str {
        non_empty(&self.name).unwrap_or(UNKNOWN)
    }

    /// Name shown in the header popover.
    pub fn display_name(&self) -> &str {
        non_empty(&self.name).unwrap_or(GUEST_NAME)
    }

    /// First eight characters of the id, as shown in the popover.
    pub fn short_id(&self) -> String {
        match non_empty(&self.id) {
            Some(id) => id.chars().take(8).collect(),
            None => UNKNOWN.to_string(),
        }
    }
}

impl From<&UserRecord> for SessionIdentity {
    fn from(record: &UserRecord) -> Self {
        Self::new(
            record.id.clone(),
            Some(record.email.clone()),
            Some(record.name.clone()),
        )
    }
}

impl From<SessionClaims> for SessionIdentity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: Some(claims.sub).filter(|s| !s.is_empty()),
            email: claims.email,
            name: claims.name,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionService {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionService {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn max_age_secs(&self) -> i64 {
        self.config.max_age.as_secs() as i64
    }

    pub fn issue(&self, identity: &SessionIdentity) -> Result<IssuedSession, SessionError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: identity.id.clone().unwrap_or_default(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            iat: now,
            exp: now + self.max_age_secs(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(SessionError::Encode)?;

        Ok(IssuedSession {
            token,
            expires_at: timestamp_to_utc(claims.exp),
        })
    }

    /// Checks signature and expiry.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(SessionError::Invalid)
    }

    /// True once less than half of the token's lifetime remains.
    pub fn needs_refresh(&self, claims: &SessionClaims) -> bool {
        let remaining = claims.exp - Utc::now().timestamp();
        remaining < self.max_age_secs() / 2
    }

    pub fn cookie(&self, issued: &IssuedSession) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, issued.token.clone()))
            .path("/")
            .http_only(true)
            .secure(self.config.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.max_age_secs()))
            .build()
    }

    /// Cookie that, when removed from a jar, deletes the session on the client.
    pub fn removal_cookie() -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE).path("/").build()
    }
}

pub fn timestamp_to_utc(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config() -> SessionConfig {
        SessionConfig {
            secret: "test-secret-key-for-testing".to_string(),
            max_age: Duration::from_secs(3600),
            cookie_secure: false,
        }
    }

    fn jo() -> SessionIdentity {
        SessionIdentity::new(
            "4f1c2a9e-0000-0000-0000-000000000000",
            Some("jo@x.com".to_string()),
            Some("Jo".to_string()),
        )
    }

    #[test]
    fn test_issue_and_validate_preserves_identity() {
        let service = SessionService::new(test_config());
        let issued = service.issue(&jo()).unwrap();

        let claims = service.validate(&issued.token).unwrap();
        assert_eq!(SessionIdentity::from(claims.clone()), jo());
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let service = SessionService::new(test_config());
        let other = SessionService::new(SessionConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        });
        let issued = other.issue(&jo()).unwrap();
        assert!(service.validate(&issued.token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = SessionService::new(test_config());
        assert!(service.validate("not-a-token").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = SessionService::new(test_config());
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "1".to_string(),
            email: None,
            name: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-for-testing"),
        )
        .unwrap();
        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_missing_claims_render_as_unknown() {
        let service = SessionService::new(test_config());
        let identity = SessionIdentity::new("google-123", None, None);
        let issued = service.issue(&identity).unwrap();

        let restored = SessionIdentity::from(service.validate(&issued.token).unwrap());
        assert_eq!(restored.name_or_unknown(), "N/A");
        assert_eq!(restored.email_or_unknown(), "N/A");
        assert_eq!(restored.display_name(), "Guest User");
        assert_eq!(restored.id_or_unknown(), "google-123");
    }

    #[test]
    fn test_empty_id_renders_unknown() {
        let identity = SessionIdentity {
            id: None,
            email: None,
            name: Some("  ".to_string()),
        };
        assert_eq!(identity.short_id(), "N/A");
        assert_eq!(identity.display_name(), "Guest User");
    }

    #[test]
    fn test_short_id_truncates_to_eight() {
        assert_eq!(jo().short_id(), "4f1c2a9e");
    }

    #[test]
    fn test_needs_refresh_after_half_lifetime() {
        let service = SessionService::new(test_config());
        let now = Utc::now().timestamp();
        let fresh = SessionClaims {
            sub: "1".to_string(),
            email: None,
            name: None,
            iat: now,
            exp: now + 3600,
        };
        let stale = SessionClaims {
            iat: now - 3000,
            exp: now + 600,
            ..fresh.clone()
        };
        assert!(!service.needs_refresh(&fresh));
        assert!(service.needs_refresh(&stale));
    }

    #[test]
    fn test_cookie_attributes() {
        let service = SessionService::new(test_config());
        let issued = service.issue(&jo()).unwrap();
        let cookie = service.cookie(&issued);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
