use std::sync::Arc;
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{error, info};
use regex::Regex;
use serde_json::Value;
use crate::config::{AppConfig, CloudProvider};
use crate::error::ChatError;
use crate::models::chat_request::Mode;
use crate::models::message::Message;
use crate::services::backends::{
    cohere::CohereBackend, gemini::GeminiBackend, ollama::OllamaBackend, together::TogetherBackend,
};
use crate::services::stream_decoder::FragmentStream;
use crate::services::transport::{OutboundRequest, Transport, TransportResponse};

lazy_static! {
    // values like "your_cohere_api_key_here" shipped in example env files
    static ref PLACEHOLDER_KEY: Regex = Regex::new(r"(?i)^your_.*_key_here$").unwrap();
}

/// An LLM provider that answers a conversation with a stream of text fragments.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Human readable name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Sends `conversation` (oldest first, ending with the new user turn) with
    /// `system_prompt` as the system instruction. Each call is a new request.
    async fn send(
        &self,
        conversation: &[Message],
        system_prompt: &str,
    ) -> Result<FragmentStream, ChatError>;
}

/// A usable API key: the per-request key if given, else the configured one.
/// Empty and placeholder values count as absent.
pub fn resolve_credential(
    request_key: Option<&str>,
    configured_key: Option<&str>,
    env_var: &str,
) -> Result<String, ChatError> {
    [request_key, configured_key]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|key| !key.is_empty() && !is_placeholder(key))
        .map(str::to_string)
        .ok_or_else(|| {
            ChatError::Configuration(format!(
                "API key is required. Please set {} in your environment or provide it in settings.",
                env_var
            ))
        })
}

pub fn is_placeholder(key: &str) -> bool {
    PLACEHOLDER_KEY.is_match(key.trim())
}

/// Picks the backend for `mode`. Cloud backends check their credential here,
/// so a missing key fails before anything is sent.
pub fn select_backend(
    mode: Mode,
    request_key: Option<&str>,
    config: &AppConfig,
    transport: Arc<dyn Transport>,
) -> Result<Box<dyn InferenceBackend>, ChatError> {
    let backend: Box<dyn InferenceBackend> = match mode {
        Mode::Local => Box::new(OllamaBackend::new(config.ollama.clone(), transport)),
        Mode::Cloud => {
            let provider = config.cloud_provider;
            let settings = config.cloud_settings(provider).clone();
            let api_key =
                resolve_credential(request_key, settings.api_key.as_deref(), provider.key_var())?;
            match provider {
                CloudProvider::Cohere => Box::new(CohereBackend::new(settings, api_key, transport)),
                CloudProvider::Together => {
                    Box::new(TogetherBackend::new(settings, api_key, transport))
                }
                CloudProvider::Gemini => Box::new(GeminiBackend::new(settings, api_key, transport)),
            }
        }
    };
    info!("Selected {} backend", backend.name());
    Ok(backend)
}

/// Posts `request`, turning a missing response or a non-success status into a
/// `BackendError` that names `service`.
pub async fn post_checked(
    transport: &dyn Transport,
    service: &str,
    request: OutboundRequest,
) -> Result<TransportResponse, ChatError> {
    let response = transport.post(request).await.map_err(|e| {
        error!("Could not reach {}: {}", service, e);
        ChatError::backend(None, format!("Could not reach {}: {}", service, e))
    })?;

    if response.is_success() {
        return Ok(response);
    }

    let status = response.status;
    let body = response.text().await.unwrap_or_default();
    let message = vendor_error_message(&body).unwrap_or_else(|| status_text(status));
    error!("{} returned {}: {}", service, status, message);
    Err(ChatError::backend(Some(status), format!("{} error {}: {}", service, status, message)))
}

/// Pulls the human readable message out of a vendor error body.
fn vendor_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let json: Value = match serde_json::from_str(trimmed) {
        Ok(json) => json,
        Err(_) => return Some(trimmed.to_string()),
    };
    json.get("message")
        .and_then(Value::as_str)
        .or_else(|| json.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| json.get("error").and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| Some(trimmed.to_string()))
}

fn status_text(status: u16) -> String {
    actix_web::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("request failed")
        .to_string()
}
