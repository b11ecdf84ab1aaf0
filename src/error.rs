use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

/// Errors raised while turning a chat request into a streamed reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// A credential the selected backend needs is missing or still a placeholder.
    #[error("{0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// The inference backend answered with a non-success status, an error
    /// frame, or a payload we could not read, or it could not be reached.
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    /// A single uploaded document could not be decoded.
    #[error("Could not extract text from {document}: {reason}")]
    Extraction { document: String, reason: String },

    /// The backend stream broke off after it started.
    #[error("Stream interrupted: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        ChatError::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn extraction(document: impl Into<String>, reason: impl ToString) -> Self {
        ChatError::Extraction {
            document: document.into(),
            reason: reason.to_string(),
        }
    }
}

impl ResponseError for ChatError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChatError::Configuration(_) | ChatError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::Unauthorized => StatusCode::UNAUTHORIZED,
            ChatError::Backend { .. }
            | ChatError::Extraction { .. }
            | ChatError::Io(_)
            | ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
