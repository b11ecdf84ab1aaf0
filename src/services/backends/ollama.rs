use std::sync::Arc;
use async_trait::async_trait;
use log::info;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::{ChatMessage, ChatMessageResponse};
use serde::Deserialize;
use serde_json::Value;
use crate::config::BackendSettings;
use crate::error::ChatError;
use crate::models::message::{Message, Role};
use crate::services::llm_service::{post_checked, InferenceBackend};
use crate::services::stream_decoder::{ndjson_fragments, FragmentStream, FrameResult};
use crate::services::transport::{OutboundRequest, Transport};

/// One line of an `/api/chat` stream: a chat chunk or an error report.
#[derive(Deserialize)]
#[serde(untagged)]
enum OllamaFrame {
    Error { error: String },
    Chunk(ChatMessageResponse),
}

fn chunk_content(frame: OllamaFrame) -> FrameResult {
    match frame {
        OllamaFrame::Error { error } => {
            Err(ChatError::backend(None, format!("Ollama error: {}", error)))
        }
        OllamaFrame::Chunk(chunk) => Ok(Some(chunk.message.content)),
    }
}

fn chat_request(model: &str, conversation: &[Message], system_prompt: &str) -> ChatMessageRequest {
    let mut messages = vec![ChatMessage::system(system_prompt.to_string())];
    messages.extend(conversation.iter().map(|m| match m.role {
        Role::User => ChatMessage::user(m.content.clone()),
        Role::Assistant => ChatMessage::assistant(m.content.clone()),
    }));
    ChatMessageRequest::new(model.to_string(), messages)
}

/// A local Ollama server, streaming newline-delimited JSON.
pub struct OllamaBackend {
    settings: BackendSettings,
    transport: Arc<dyn Transport>,
}

impl OllamaBackend {
    pub fn new(settings: BackendSettings, transport: Arc<dyn Transport>) -> Self {
        OllamaBackend { settings, transport }
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    async fn send(
        &self,
        conversation: &[Message],
        system_prompt: &str,
    ) -> Result<FragmentStream, ChatError> {
        let request = chat_request(&self.settings.model, conversation, system_prompt);
        let mut body =
            serde_json::to_value(&request).map_err(|e| ChatError::Internal(e.to_string()))?;
        // the request type only streams when sent through ollama-rs' own client
        body["stream"] = Value::Bool(true);

        let url = super::endpoint(&self.settings.base_url, "api/chat");
        info!(
            "Streaming {} turn(s) to Ollama model {}",
            conversation.len(),
            self.settings.model
        );
        let service = format!(
            "Ollama at {}",
            self.settings.base_url.as_str().trim_end_matches('/')
        );
        let response = post_checked(
            self.transport.as_ref(),
            &service,
            OutboundRequest::new(url, body),
        )
        .await
        .map_err(|e| match e {
            ChatError::Backend { status: None, message } => ChatError::Backend {
                status: None,
                message: format!("{}. Make sure Ollama is running locally.", message),
            },
            other => other,
        })?;

        Ok(ndjson_fragments(response.body, chunk_content))
    }
}
