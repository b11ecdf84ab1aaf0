use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use legal_oracle::config::{self, AppConfig};
use legal_oracle::routes::app_state::{session_middleware, AppState};
use legal_oracle::routes::{auth_routes, chat_routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    config::init_logging();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    if config.admin_email.is_none() || config.admin_password_hash.is_none() {
        log::warn!("ADMIN_EMAIL or ADMIN_PASSWORD_HASH is not set; login is disabled");
    }

    let bind = (config.host.clone(), config.port);
    let key = config.session_key();
    let secure = config.secure_cookies;
    let max_body_bytes = config.max_body_bytes;
    let static_dir = config.static_dir.clone();
    let state = web::Data::new(AppState::from_config(config));

    log::info!("Starting server on http://{}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .wrap(session_middleware(key.clone(), secure))
            .wrap(Logger::default())
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_body_bytes))
            .app_data(web::JsonConfig::default().limit(max_body_bytes))
            .configure(chat_routes::init_routes)
            .configure(auth_routes::init_routes)
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .bind(bind)
    .with_context(|| "Failed to bind server address")?
    .run()
    .await
    .context("Server error")
}
