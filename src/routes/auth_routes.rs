use actix_session::Session;
use actix_web::{get, post, web, Responder};
use crate::handlers::auth_handler;
use crate::routes::app_state::AppState;
use crate::services::auth_service::{ChangePasswordRequest, LoginRequest};

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(logout)
        .service(session_status)
        .service(change_password);
}

#[post("/api/auth/login")]
async fn login(
    data: web::Data<AppState>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> impl Responder {
    auth_handler::login(data, session, body).await
}

#[post("/api/auth/logout")]
async fn logout(session: Session) -> impl Responder {
    auth_handler::logout(session).await
}

#[get("/api/auth/session")]
async fn session_status(session: Session) -> impl Responder {
    auth_handler::session_status(session).await
}

#[post("/api/auth/change-password")]
async fn change_password(
    data: web::Data<AppState>,
    session: Session,
    body: web::Json<ChangePasswordRequest>,
) -> impl Responder {
    auth_handler::change_password(data, session, body).await
}
