use std::sync::Arc;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use crate::config::BackendSettings;
use crate::error::ChatError;
use crate::models::message::{Message, Role};
use crate::services::llm_service::{post_checked, InferenceBackend};
use crate::services::stream_decoder::{single_fragment, FragmentStream};
use crate::services::transport::{OutboundRequest, Transport};

const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct CohereChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    preamble: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    chat_history: Vec<CohereTurn<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct CohereTurn<'a> {
    role: &'static str,
    message: &'a str,
}

#[derive(Deserialize)]
struct CohereChatResponse {
    #[serde(default)]
    text: String,
}

/// Cohere chat API. Replies arrive in one payload, relayed as a single fragment.
pub struct CohereBackend {
    settings: BackendSettings,
    api_key: String,
    transport: Arc<dyn Transport>,
}

impl CohereBackend {
    pub fn new(settings: BackendSettings, api_key: String, transport: Arc<dyn Transport>) -> Self {
        CohereBackend {
            settings,
            api_key,
            transport,
        }
    }
}

#[async_trait]
impl InferenceBackend for CohereBackend {
    fn name(&self) -> &'static str {
        "Cohere"
    }

    async fn send(
        &self,
        conversation: &[Message],
        system_prompt: &str,
    ) -> Result<FragmentStream, ChatError> {
        let (last, history) = conversation
            .split_last()
            .ok_or_else(|| ChatError::BadRequest("Conversation is empty".to_string()))?;

        let chat_history = history
            .iter()
            .map(|m| CohereTurn {
                role: match m.role {
                    Role::User => "USER",
                    Role::Assistant => "CHATBOT",
                },
                message: &m.content,
            })
            .collect();
        let payload = CohereChatRequest {
            model: &self.settings.model,
            message: &last.content,
            preamble: system_prompt,
            chat_history,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let body = serde_json::to_value(&payload).map_err(|e| ChatError::Internal(e.to_string()))?;

        let url = super::endpoint(&self.settings.base_url, "v1/chat");
        info!("Sending to Cohere with system prompt length: {}", system_prompt.len());
        let request = OutboundRequest::new(url, body).bearer(&self.api_key);
        let response = post_checked(self.transport.as_ref(), self.name(), request).await?;

        let raw = response.text().await?;
        let reply: CohereChatResponse = serde_json::from_str(&raw)
            .map_err(|e| {
                ChatError::backend(None, format!("Cohere returned an unreadable reply: {}", e))
            })?;
        info!("Cohere response length: {}", reply.text.len());
        Ok(single_fragment(reply.text))
    }
}
