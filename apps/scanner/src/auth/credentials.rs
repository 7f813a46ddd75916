//! Signup and the credential sign-in path.

use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::store::CredentialStore;
use crate::config::DemoUser;
use crate::errors::AppError;
use crate::models::user::{NewUser, PublicUser, UserRecord};

/// Minimum length the signup and reset forms ask for. The JSON signup
/// endpoint does not re-check it.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hashes the password and appends a new record.
/// Fails with `AppError::Conflict` when the email is already registered.
pub async fn register(
    store: &dyn CredentialStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<PublicUser, AppError> {
    let password_hash = hash_password(password)?;

    let record = store
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await?;

    info!(user_id = %record.id, email = %record.email, "user registered");
    Ok(PublicUser::from(&record))
}

/// Returns the matching record, or `None` on any mismatch or missing field.
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn verify_credentials(
    store: &dyn CredentialStore,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<Option<UserRecord>, AppError> {
    let (Some(email), Some(password)) = (
        email.filter(|e| !e.is_empty()),
        password.filter(|p| !p.is_empty()),
    ) else {
        return Ok(None);
    };

    let Some(record) = store.find_by_email(email).await? else {
        return Ok(None);
    };

    if verify_password(password, &record.password_hash)? {
        Ok(Some(record))
    } else {
        Ok(None)
    }
}

/// Page-level checks applied by the signup and reset forms.
pub fn check_new_password(password: &str, confirm: &str) -> Result<(), String> {
    if password != confirm {
        return Err("Passwords do not match".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}

/// Registers the configured demo account. An existing record with the same
/// email is left untouched.
pub async fn seed_demo_user(store: &dyn CredentialStore, demo: &DemoUser) -> Result<(), AppError> {
    match register(store, &demo.name, &demo.email, &demo.password).await {
        Ok(_) | Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
