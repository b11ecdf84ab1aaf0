use std::sync::Arc;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use crate::config::BackendSettings;
use crate::error::ChatError;
use crate::models::message::Message;
use crate::services::llm_service::{post_checked, InferenceBackend};
use crate::services::stream_decoder::{sse_fragments, FragmentStream, FrameResult};
use crate::services::transport::{OutboundRequest, Transport};

const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.7;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

// OpenAI-style streaming chunk; only the delta text matters here
#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

fn chunk_delta(chunk: CompletionChunk) -> FrameResult {
    if let Some(error) = chunk.error {
        let message = format!("Together AI stream error: {}", error.message);
        return Err(ChatError::backend(None, message));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content))
}

/// Together AI chat completions, streamed as server-sent events.
pub struct TogetherBackend {
    settings: BackendSettings,
    api_key: String,
    transport: Arc<dyn Transport>,
}

impl TogetherBackend {
    pub fn new(settings: BackendSettings, api_key: String, transport: Arc<dyn Transport>) -> Self {
        TogetherBackend {
            settings,
            api_key,
            transport,
        }
    }
}

#[async_trait]
impl InferenceBackend for TogetherBackend {
    fn name(&self) -> &'static str {
        "Together AI"
    }

    async fn send(
        &self,
        conversation: &[Message],
        system_prompt: &str,
    ) -> Result<FragmentStream, ChatError> {
        let mut messages = vec![CompletionMessage {
            role: "system",
            content: system_prompt,
        }];
        messages.extend(conversation.iter().map(|m| CompletionMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        let payload = CompletionRequest {
            model: &self.settings.model,
            messages,
            stream: true,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let body = serde_json::to_value(&payload).map_err(|e| ChatError::Internal(e.to_string()))?;

        let url = super::endpoint(&self.settings.base_url, "v1/chat/completions");
        info!(
            "Streaming {} turn(s) to Together AI model {}",
            conversation.len(),
            self.settings.model
        );
        let request = OutboundRequest::new(url, body).bearer(&self.api_key);
        let response = post_checked(self.transport.as_ref(), self.name(), request).await?;

        Ok(sse_fragments(response.body, chunk_delta))
    }
}
