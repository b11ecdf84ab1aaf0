use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::{error, info, warn};
use serde_json::json;
use crate::handlers::chat_handler::current_user;
use crate::models::user_session::{UserSession, SESSION_KEY};
use crate::routes::app_state::AppState;
use crate::services::auth_service::{self, AuthError, ChangePasswordRequest, LoginRequest};

pub async fn login(
    data: web::Data<AppState>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    let credentials = data.credentials.read().await;
    let email = auth_service::verify_credentials(credentials.as_ref(), &body)?;

    session.renew();
    session.insert(SESSION_KEY, UserSession::logged_in(&email)).map_err(|e| {
        error!("Failed to store login in session: {}", e);
        AuthError::Session(e.to_string())
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Login successful" })))
}

pub async fn logout(session: Session) -> HttpResponse {
    let user = current_user(&session);
    session.purge();
    if user.is_logged_in {
        info!("Admin {} logged out", user.email);
    }
    HttpResponse::Ok().json(json!({ "success": true, "message": "Logged out successfully" }))
}

pub async fn session_status(session: Session) -> HttpResponse {
    HttpResponse::Ok().json(current_user(&session))
}

pub async fn change_password(
    data: web::Data<AppState>,
    session: Session,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AuthError> {
    if !current_user(&session).is_logged_in {
        return Err(AuthError::NotLoggedIn);
    }

    let mut guard = data.credentials.write().await;
    let credentials = guard.as_mut().ok_or(AuthError::MissingConfiguration)?;
    auth_service::change_password(credentials, &body)?;
    warn!(
        "Password changed in memory only; run hash_password and update \
         ADMIN_PASSWORD_HASH to keep it after a restart"
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}
