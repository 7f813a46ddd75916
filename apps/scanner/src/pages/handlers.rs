use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::credentials::{check_new_password, register, verify_credentials, MIN_PASSWORD_LEN};
use crate::auth::handlers::{end_session, start_session};
use crate::auth::middleware::{OptionalSession, LOGIN_PATH};
use crate::auth::password::hash_password;
use crate::auth::{PageUser, SessionIdentity};
use crate::errors::AppError;
use crate::models::scan::{
    ScanRequest, ScanResult, MARKS_BEFORE_REQUEST, PROGRESS_MARKS, PROGRESS_STEP_DELAY_MS,
    SCAN_STEPS,
};
use crate::scan::client::ScanError;
use crate::state::AppState;

const INCOMPLETE_SCAN: &str = "Please fill in both job description and folder name.";
const RESET_SENT: &str = "If an account exists for that email, a password reset link has been sent.";
const RESET_DONE: &str = "Password successfully reset. You can now sign in with your new password.";
const RESET_INVALID: &str = "Invalid or expired reset link";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScanForm {
    pub job_description: String,
    pub folder_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetForm {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

fn with_status(status: StatusCode, page: Html<String>) -> Response {
    (status, page).into_response()
}

// ── Scanner ─────────────────────────────────────────────────────────────────

fn scanner_view(form: &ScanRequest, result: Option<&ScanResult>, error: Option<&str>) -> Value {
    let steps: Vec<Value> = SCAN_STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| json!({ "number": i + 1, "title": step.title, "desc": step.desc }))
        .collect();
    let marks: Vec<[u64; 2]> = PROGRESS_MARKS
        .iter()
        .map(|&(step, percent)| [step as u64, u64::from(percent)])
        .collect();

    json!({
        "form": form,
        "steps": steps,
        "progress_json": json!(marks).to_string(),
        "marks_before_request": MARKS_BEFORE_REQUEST,
        "step_delay_ms": PROGRESS_STEP_DELAY_MS,
        "error": error,
        "result": result.map(|r| json!({
            "name": r.name,
            "contact": r.contact,
            "status": r.status,
            "shortlisted": r.is_shortlisted(),
            "score": r.score_label(),
            "reason": r.reason,
        })),
    })
}

/// GET /
pub async fn scanner_page(
    State(state): State<AppState>,
    PageUser(user): PageUser,
) -> Result<Html<String>, AppError> {
    let empty = ScanRequest {
        job_description: String::new(),
        folder_name: String::new(),
    };
    state.pages.render("scanner", Some(&user), scanner_view(&empty, None, None))
}

/// POST /
///
/// Form-encoded submission for browsers without scripting. Goes through the
/// same webhook client as `/api/submit` and renders the result in place.
pub async fn scanner_submit(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Form(form): Form<ScanForm>,
) -> Result<Response, AppError> {
    let request = ScanRequest {
        job_description: form.job_description,
        folder_name: form.folder_name,
    };

    if !request.is_complete() {
        let page = state.pages.render(
            "scanner",
            Some(&user),
            scanner_view(&request, None, Some(INCOMPLETE_SCAN)),
        )?;
        return Ok(with_status(StatusCode::BAD_REQUEST, page));
    }

    match state.scanner.submit(&request).await {
        Ok(result) => {
            info!(user_id = user.id_or_unknown(), status = %result.status, "scan completed");
            let page = state
                .pages
                .render("scanner", Some(&user), scanner_view(&request, Some(&result), None))?;
            Ok(page.into_response())
        }
        Err(e) => {
            warn!(user_id = user.id_or_unknown(), "scan failed: {e}");
            let message = match e {
                ScanError::Status(code) => format!("HTTP error! status: {code}"),
                other => other.to_string(),
            };
            let page = state.pages.render(
                "scanner",
                Some(&user),
                scanner_view(&request, None, Some(&message)),
            )?;
            Ok(with_status(StatusCode::BAD_GATEWAY, page))
        }
    }
}

// ── Login / signup ──────────────────────────────────────────────────────────

fn login_view(state: &AppState, email: &str, error: Option<&str>) -> Value {
    json!({
        "email": email,
        "error": error,
        "google_enabled": state.google.is_some(),
    })
}

/// GET /auth/login
pub async fn login_page(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, AppError> {
    let error = query.error.as_deref().map(|code| match code {
        "OAuthSignin" | "OAuthCallback" => "Sign-in with Google failed",
        _ => "Sign-in failed",
    });
    state
        .pages
        .render("login", session.as_ref(), login_view(&state, "", error))
}

/// POST /auth/login
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let record = verify_credentials(
        state.users.as_ref(),
        Some(form.email.as_str()),
        Some(form.password.as_str()),
    )
    .await?;

    let Some(record) = record else {
        warn!(email = %form.email, "login failed");
        let page = state.pages.render(
            "login",
            None,
            login_view(&state, &form.email, Some("Invalid email or password")),
        )?;
        return Ok(with_status(StatusCode::UNAUTHORIZED, page));
    };

    let jar = start_session(&state.sessions, jar, &SessionIdentity::from(&record))?;
    info!(user_id = %record.id, "signed in");
    Ok((jar, Redirect::to("/")).into_response())
}

fn signup_view(name: &str, email: &str, error: Option<&str>) -> Value {
    json!({
        "name": name,
        "email": email,
        "error": error,
        "min_password_len": MIN_PASSWORD_LEN,
    })
}

/// GET /auth/signup
pub async fn signup_page(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
) -> Result<Html<String>, AppError> {
    state
        .pages
        .render("signup", session.as_ref(), signup_view("", "", None))
}

/// POST /auth/signup
///
/// Checks the confirmation and minimum length before registering, then signs
/// the new user in.
pub async fn signup_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let rejected = |message: &str| -> Result<Response, AppError> {
        let page = state
            .pages
            .render("signup", None, signup_view(&form.name, &form.email, Some(message)))?;
        Ok(with_status(StatusCode::BAD_REQUEST, page))
    };

    if form.name.trim().is_empty() || form.email.trim().is_empty() {
        return rejected("Name, email and password are required");
    }
    if let Err(message) = check_new_password(&form.password, &form.confirm_password) {
        return rejected(&message);
    }

    let user = match register(state.users.as_ref(), &form.name, &form.email, &form.password).await {
        Ok(user) => user,
        Err(AppError::Conflict(message)) => return rejected(&message),
        Err(e) => return Err(e),
    };

    let identity = SessionIdentity::new(user.id, Some(user.email), Some(user.name));
    let jar = start_session(&state.sessions, jar, &identity)?;
    Ok((jar, Redirect::to("/")).into_response())
}

// ── Password recovery ───────────────────────────────────────────────────────

/// GET /auth/forgot-password
pub async fn forgot_password_page(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
) -> Result<Html<String>, AppError> {
    state
        .pages
        .render("forgot_password", session.as_ref(), json!({ "email": "" }))
}

/// POST /auth/forgot-password
///
/// The confirmation is identical whether or not the email is registered.
pub async fn forgot_password_submit(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Form(form): Form<ForgotForm>,
) -> Result<Html<String>, AppError> {
    let email = form.email.trim();
    if email.is_empty() {
        return state.pages.render(
            "forgot_password",
            session.as_ref(),
            json!({ "email": "", "error": "Please enter your email" }),
        );
    }

    if state.users.find_by_email(email).await?.is_some() {
        let token = state.recovery.issue(email);
        info!(
            %email,
            "Password reset requested: {}/auth/reset-password?token={token}",
            state.config.base_url
        );
    } else {
        info!(%email, "Password reset requested for unknown email");
    }

    state.pages.render(
        "forgot_password",
        session.as_ref(),
        json!({ "email": email, "message": RESET_SENT }),
    )
}

fn reset_view(token: Option<&str>, message: Option<&str>, error: Option<&str>) -> Value {
    json!({
        "token": token,
        "message": message,
        "error": error,
        "min_password_len": MIN_PASSWORD_LEN,
    })
}

/// GET /auth/reset-password?token=
pub async fn reset_password_page(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Query(query): Query<ResetQuery>,
) -> Result<Response, AppError> {
    let token = query.token.filter(|t| !t.is_empty());
    match token {
        Some(token) if state.recovery.is_valid(&token) => {
            let page = state.pages.render(
                "reset_password",
                session.as_ref(),
                reset_view(Some(&token), None, None),
            )?;
            Ok(page.into_response())
        }
        _ => {
            let page = state.pages.render(
                "reset_password",
                session.as_ref(),
                reset_view(None, None, Some(RESET_INVALID)),
            )?;
            Ok(with_status(StatusCode::BAD_REQUEST, page))
        }
    }
}

/// POST /auth/reset-password
///
/// Form checks run before the ticket is consumed, so a typo does not burn it.
pub async fn reset_password_submit(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Form(form): Form<ResetForm>,
) -> Result<Response, AppError> {
    if !state.recovery.is_valid(&form.token) {
        let page = state.pages.render(
            "reset_password",
            session.as_ref(),
            reset_view(None, None, Some(RESET_INVALID)),
        )?;
        return Ok(with_status(StatusCode::BAD_REQUEST, page));
    }

    if let Err(message) = check_new_password(&form.password, &form.confirm_password) {
        let page = state.pages.render(
            "reset_password",
            session.as_ref(),
            reset_view(Some(&form.token), None, Some(&message)),
        )?;
        return Ok(with_status(StatusCode::BAD_REQUEST, page));
    }

    let Some(email) = state.recovery.consume(&form.token) else {
        let page = state.pages.render(
            "reset_password",
            session.as_ref(),
            reset_view(None, None, Some(RESET_INVALID)),
        )?;
        return Ok(with_status(StatusCode::BAD_REQUEST, page));
    };

    let password_hash = hash_password(&form.password)?;
    state.users.set_password_hash(&email, password_hash).await?;
    info!(%email, "password reset");

    let page = state.pages.render(
        "reset_password",
        session.as_ref(),
        reset_view(None, Some(RESET_DONE), None),
    )?;
    Ok(page.into_response())
}

// ── Profile / sign-out ──────────────────────────────────────────────────────

/// GET /auth/profile
pub async fn profile_page(
    State(state): State<AppState>,
    PageUser(user): PageUser,
) -> Result<Html<String>, AppError> {
    let profile = json!({
        "id": user.id_or_unknown(),
        "name": user.name_or_unknown(),
        "email": user.email_or_unknown(),
    });
    state
        .pages
        .render("profile", Some(&user), json!({ "profile": profile }))
}

/// POST /auth/signout
pub async fn sign_out(jar: CookieJar) -> (CookieJar, Redirect) {
    info!("signed out");
    (end_session(jar), Redirect::to(LOGIN_PATH))
}
