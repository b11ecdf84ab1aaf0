pub mod config;
pub mod error;

pub mod models {
    pub mod chat_request;
    pub mod chat_session;
    pub mod citation;
    pub mod file_context;
    pub mod message;
    pub mod user_session;
}

pub mod services {
    pub mod auth_service;
    pub mod chat_service;
    pub mod document_service;
    pub mod llm_service;
    pub mod prompt_service;
    pub mod stream_decoder;
    pub mod transport;

    pub mod backends;
}

pub mod handlers {
    pub mod auth_handler;
    pub mod chat_handler;
}

pub mod routes {
    pub mod app_state;
    pub mod auth_routes;
    pub mod chat_routes;
}
