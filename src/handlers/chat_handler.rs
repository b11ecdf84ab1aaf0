use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::Bytes;
use futures::StreamExt;
use log::{error, info, warn};
use crate::error::ChatError;
use crate::models::chat_request::{ChatRequest, CURRENT_SCHEMA, SCHEMA_HEADER};
use crate::models::user_session::{UserSession, SESSION_KEY};
use crate::routes::app_state::AppState;
use crate::services::chat_service;

/// Login state from the cookie. Unreadable or expired state counts as logged out.
pub fn current_user(session: &Session) -> UserSession {
    let stored = session.get::<UserSession>(SESSION_KEY).unwrap_or_else(|e| {
        warn!("Discarding unreadable session state: {}", e);
        None
    });
    UserSession::current(stored)
}

fn schema_version(req: &HttpRequest) -> Result<u32, ChatError> {
    match req.headers().get(SCHEMA_HEADER) {
        None => Ok(CURRENT_SCHEMA),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| ChatError::BadRequest(format!("Invalid {} header", SCHEMA_HEADER))),
    }
}

pub async fn handle_chat_request(
    req: HttpRequest,
    data: web::Data<AppState>,
    session: Session,
    body: web::Bytes,
) -> Result<HttpResponse, ChatError> {
    let user = current_user(&session);
    if !user.is_logged_in {
        warn!("Rejected chat request without a login session");
        return Err(ChatError::Unauthorized);
    }

    let request = ChatRequest::from_slice(&body, schema_version(&req)?)?;
    info!("Chat request from {} in {:?} mode", user.email, request.mode);

    let fragments =
        chat_service::process_chat(request, &data.config, data.transport.clone()).await?;
    let body = fragments.map(|fragment| {
        fragment.map(Bytes::from).map_err(|e| {
            // headers are already sent, so the chunked body is cut short
            error!("Chat stream aborted: {}", e);
            e
        })
    });

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .streaming(body))
}
