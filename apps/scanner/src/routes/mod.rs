pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::{handlers as auth, middleware::refresh_session};
use crate::pages::handlers as pages;
use crate::scan::handlers as scan;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth API
        .route(
            "/api/auth/signup",
            get(auth::handle_list_users).post(auth::handle_signup),
        )
        .route("/api/auth/providers", get(auth::handle_providers))
        .route("/api/auth/session", get(auth::handle_session))
        .route(
            "/api/auth/callback/credentials",
            post(auth::handle_credentials_sign_in),
        )
        .route("/api/auth/signin/google", get(auth::handle_google_sign_in))
        .route(
            "/api/auth/callback/google",
            get(auth::handle_google_callback),
        )
        .route("/api/auth/signout", post(auth::handle_sign_out))
        // Scan proxy
        .route("/api/submit", post(scan::handle_submit))
        // Pages
        .route("/", get(pages::scanner_page).post(pages::scanner_submit))
        .route(
            "/auth/login",
            get(pages::login_page).post(pages::login_submit),
        )
        .route(
            "/auth/signup",
            get(pages::signup_page).post(pages::signup_submit),
        )
        .route(
            "/auth/forgot-password",
            get(pages::forgot_password_page).post(pages::forgot_password_submit),
        )
        .route(
            "/auth/reset-password",
            get(pages::reset_password_page).post(pages::reset_password_submit),
        )
        .route("/auth/profile", get(pages::profile_page))
        .route("/auth/signout", post(pages::sign_out))
        .layer(middleware::from_fn_with_state(state.clone(), refresh_session))
        .with_state(state)
}
