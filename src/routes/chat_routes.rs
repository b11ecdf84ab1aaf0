use actix_session::Session;
use actix_web::{post, web, HttpRequest, Responder};
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(chat);
}

#[post("/api/chat")]
async fn chat(
    req: HttpRequest,
    data: web::Data<AppState>,
    session: Session,
    body: web::Bytes,
) -> impl Responder {
    crate::handlers::chat_handler::handle_chat_request(req, data, session, body).await
}
