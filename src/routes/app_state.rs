use std::sync::Arc;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use tokio::sync::RwLock;
use crate::config::AppConfig;
use crate::services::auth_service::AdminCredentials;
use crate::services::transport::{HttpTransport, Transport};

pub const SESSION_COOKIE: &str = "session";
const SESSION_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub transport: Arc<dyn Transport>,
    /// Replaced in memory by a password change; the environment is not rewritten.
    pub credentials: Arc<RwLock<Option<AdminCredentials>>>,
}

impl AppState {
    pub fn new(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        let credentials = AdminCredentials::from_config(
            config.admin_email.as_deref(),
            config.admin_password_hash.as_deref(),
        );
        AppState {
            config: Arc::new(config),
            transport,
            credentials: Arc::new(RwLock::new(credentials)),
        }
    }

    /// State backed by a real HTTP client.
    pub fn from_config(config: AppConfig) -> Self {
        AppState::new(config, Arc::new(HttpTransport::new()))
    }
}

/// Encrypted cookie sessions. Nothing is stored server side.
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_http_only(true)
        .cookie_secure(secure)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::days(SESSION_DAYS)))
        .build()
}
