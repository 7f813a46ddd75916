//! Route guards and rolling session refresh.
//!
//! Every request re-derives the session from the cookie; nothing is cached
//! server-side beyond the token's own validity window.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use crate::auth::session::{SessionIdentity, SessionService, SESSION_COOKIE};
use crate::errors::AppError;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/auth/login";

/// Reads and validates the session cookie. Invalid or expired tokens count as no session.
pub fn session_from_headers(headers: &HeaderMap, sessions: &SessionService) -> Option<SessionIdentity> {
    let jar = CookieJar::from_headers(headers);
    let cookie = jar.get(SESSION_COOKIE)?;

    match sessions.validate(cookie.value()) {
        Ok(claims) => Some(SessionIdentity::from(claims)),
        Err(e) => {
            debug!("Session cookie rejected: {e}");
            None
        }
    }
}

/// Session required; API callers get 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        session_from_headers(&parts.headers, &app.sessions)
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Session required; browsers without one are sent to the login page.
#[derive(Debug, Clone)]
pub struct PageUser(pub SessionIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for PageUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        session_from_headers(&parts.headers, &app.sessions)
            .map(PageUser)
            .ok_or_else(|| Redirect::to(LOGIN_PATH))
    }
}

/// Session if present; used by public pages to render the header.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<SessionIdentity>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        Ok(OptionalSession(session_from_headers(
            &parts.headers,
            &app.sessions,
        )))
    }
}

/// Re-issues the session cookie once less than half of its lifetime remains.
/// Responses that already set a cookie (sign-in, sign-out) are left alone.
pub async fn refresh_session(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let claims = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.validate(c.value()).ok())
        .filter(|c| state.sessions.needs_refresh(c));

    let response = next.run(request).await;

    let Some(claims) = claims else {
        return response;
    };
    if response.headers().contains_key(header::SET_COOKIE) {
        return response;
    }

    match state.sessions.issue(&SessionIdentity::from(claims)) {
        Ok(issued) => {
            debug!("Session refreshed");
            (jar.add(state.sessions.cookie(&issued)), response).into_response()
        }
        Err(e) => {
            warn!("Session refresh failed: {e}");
            response
        }
    }
}
