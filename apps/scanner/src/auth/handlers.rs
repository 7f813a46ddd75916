//! `/api/auth/*`: signup plus the session endpoints used by the pages and
//! by scripted clients.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Query, Request, State},
    http::header,
    response::Redirect,
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::credentials::{register, verify_credentials};
use crate::auth::middleware::LOGIN_PATH;
use crate::auth::oauth::{generate_state, OAUTH_STATE_COOKIE};
use crate::auth::session::{timestamp_to_utc, SessionIdentity, SessionService, SESSION_COOKIE};
use crate::errors::AppError;
use crate::models::user::PublicUser;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub ok: bool,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub signin_url: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

/// Signs a token for `identity` and adds the session cookie to `jar`.
pub fn start_session(
    sessions: &SessionService,
    jar: CookieJar,
    identity: &SessionIdentity,
) -> Result<CookieJar, AppError> {
    let issued = sessions.issue(identity)?;
    debug!(user_id = identity.id_or_unknown(), expires_at = %issued.expires_at, "session issued");
    Ok(jar.add(sessions.cookie(&issued)))
}

pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(SessionService::removal_cookie())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/signup
///
/// Password length is not checked here; only the signup form enforces it.
/// An unreadable body and internal failures both surface as 500
/// "An error occurred during signup".
pub async fn handle_signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let Json(req) = body.map_err(|e| AppError::SignupFailed(e.body_text()))?;

    let (Some(name), Some(email), Some(password)) = (req.name, req.email, req.password) else {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    };

    let user = register(state.users.as_ref(), &name, &email, &password)
        .await
        .map_err(|e| match e {
            AppError::Internal(e) => AppError::SignupFailed(format!("{e:#}")),
            other => other,
        })?;
    Ok(Json(user))
}

/// GET /api/auth/signup
///
/// Lists every registered user without password material. Unguarded; meant
/// for local testing only.
pub async fn handle_list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    Ok(Json(state.users.list().await?))
}

/// GET /api/auth/providers
pub async fn handle_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    let mut providers = vec![ProviderInfo {
        id: "credentials",
        name: "Credentials",
        kind: "credentials",
        signin_url: "/api/auth/callback/credentials",
    }];
    if state.google.is_some() {
        providers.push(ProviderInfo {
            id: "google",
            name: "Google",
            kind: "oauth",
            signin_url: "/api/auth/signin/google",
        });
    }
    Json(providers)
}

/// GET /api/auth/session
///
/// `{"user": {id, email, name}, "expires": ...}` when signed in, `{}` otherwise.
pub async fn handle_session(State(state): State<AppState>, jar: CookieJar) -> Json<Value> {
    let claims = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.validate(c.value()).ok());

    match claims {
        Some(claims) => {
            let expires = timestamp_to_utc(claims.exp).to_rfc3339();
            let identity = SessionIdentity::from(claims);
            Json(json!({ "user": identity, "expires": expires }))
        }
        None => Json(json!({})),
    }
}

/// Accepts the credentials as JSON or as a urlencoded form.
async fn read_credentials(request: Request) -> Result<CredentialsRequest, AppError> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(req) = Form::<CredentialsRequest>::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(req)
    } else {
        let Json(req) = Json::<CredentialsRequest>::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(req)
    }
}

/// POST /api/auth/callback/credentials
pub async fn handle_credentials_sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
) -> Result<(CookieJar, Json<SignInResponse>), AppError> {
    let req = read_credentials(request).await?;
    let record = verify_credentials(
        state.users.as_ref(),
        req.email.as_deref(),
        req.password.as_deref(),
    )
    .await?;

    let Some(record) = record else {
        warn!(email = req.email.as_deref().unwrap_or(""), "credential sign-in failed");
        return Err(AppError::InvalidCredentials);
    };

    let jar = start_session(&state.sessions, jar, &SessionIdentity::from(&record))?;
    info!(user_id = %record.id, "signed in with credentials");

    Ok((
        jar,
        Json(SignInResponse {
            ok: true,
            url: "/".to_string(),
        }),
    ))
}

/// POST /api/auth/signout
pub async fn handle_sign_out(jar: CookieJar) -> (CookieJar, Json<SignOutResponse>) {
    info!("signed out");
    (
        end_session(jar),
        Json(SignOutResponse {
            url: LOGIN_PATH.to_string(),
        }),
    )
}

/// GET /api/auth/signin/google
pub async fn handle_google_sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_string()))?;

    let oauth_state = generate_state();
    let url = google.authorization_url(&oauth_state)?;

    let state_cookie = Cookie::build((OAUTH_STATE_COOKIE, oauth_state))
        .path("/api/auth")
        .http_only(true)
        .secure(state.config.session.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10))
        .build();

    Ok((jar.add(state_cookie), Redirect::to(&url)))
}

/// GET /api/auth/callback/google
pub async fn handle_google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_string()))?;

    if let Some(error) = query.error {
        warn!(%error, "Google sign-in was not completed");
        return Ok((jar, Redirect::to("/auth/login?error=OAuthSignin")));
    }

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    if expected.is_none() || expected != query.state {
        return Err(AppError::Validation("Invalid OAuth state".to_string()));
    }

    let code = query
        .code
        .ok_or_else(|| AppError::Validation("Missing authorization code".to_string()))?;

    let profile = google
        .exchange_code(&code)
        .await
        .map_err(|e| AppError::OAuth(format!("{e:#}")))?;

    let identity = SessionIdentity::from(profile);
    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path("/api/auth"));
    let jar = start_session(&state.sessions, jar, &identity)?;
    info!(user_id = identity.id_or_unknown(), "signed in with Google");

    Ok((jar, Redirect::to("/")))
}
