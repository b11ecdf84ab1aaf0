use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use log::{info, warn};
use rand_core::OsRng;
use serde::Deserialize;
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// The single administrator account, loaded from configuration.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password_hash: String,
}

impl AdminCredentials {
    /// Both values must be present for login to be possible at all.
    pub fn from_config(email: Option<&str>, password_hash: Option<&str>) -> Option<Self> {
        match (email, password_hash) {
            (Some(email), Some(hash)) if !email.trim().is_empty() && !hash.trim().is_empty() => {
                Some(AdminCredentials {
                    email: email.trim().to_string(),
                    password_hash: hash.trim().to_string(),
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Admin credentials are not configured")]
    MissingConfiguration,
    #[error("Email and password are required")]
    MissingFields,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,
    #[error("New password must be at least 8 characters")]
    WeakPassword,
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Could not store session: {0}")]
    Session(String),
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingConfiguration | AuthError::Hashing(_) | AuthError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthError::InvalidCredentials | AuthError::NotLoggedIn => StatusCode::UNAUTHORIZED,
            AuthError::MissingFields
            | AuthError::IncorrectCurrentPassword
            | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // details stay in the log
            AuthError::Hashing(_) | AuthError::Session(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Hashes `password` into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// True when `password` matches `hash`. An unparsable hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!("Stored password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

/// Checks a login attempt. The email comparison ignores case.
///
/// A blank field is the caller's mistake and is reported as such even when
/// no admin account is configured.
pub fn verify_credentials(
    credentials: Option<&AdminCredentials>,
    login: &LoginRequest,
) -> Result<String, AuthError> {
    let email = login.email.trim();
    if email.is_empty() || login.password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    let credentials = credentials.ok_or(AuthError::MissingConfiguration)?;

    if !email.eq_ignore_ascii_case(&credentials.email)
        || !verify_password(&login.password, &credentials.password_hash)
    {
        warn!("Failed login attempt for {}", email);
        return Err(AuthError::InvalidCredentials);
    }
    info!("Admin {} logged in", credentials.email);
    Ok(credentials.email.clone())
}

/// Replaces the stored hash after checking the current password.
pub fn change_password(
    credentials: &mut AdminCredentials,
    request: &ChangePasswordRequest,
) -> Result<(), AuthError> {
    if request.current_password.is_empty() || request.new_password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    if !verify_password(&request.current_password, &credentials.password_hash) {
        return Err(AuthError::IncorrectCurrentPassword);
    }
    if request.new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    credentials.password_hash = hash_password(&request.new_password)?;
    info!("Password changed for {}", credentials.email);
    Ok(())
}
