use std::sync::Arc;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use crate::config::BackendSettings;
use crate::error::ChatError;
use crate::models::message::{Message, Role};
use crate::services::llm_service::{post_checked, InferenceBackend};
use crate::services::stream_decoder::{sse_fragments, FragmentStream, FrameResult};
use crate::services::transport::{OutboundRequest, Transport};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: String,
}

fn chunk_text(chunk: GenerateChunk) -> FrameResult {
    if let Some(error) = chunk.error {
        return Err(ChatError::backend(None, format!("Gemini stream error: {}", error.message)));
    }
    let text: String = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    Ok(Some(text))
}

/// Google Gemini `streamGenerateContent` with SSE framing.
pub struct GeminiBackend {
    settings: BackendSettings,
    api_key: String,
    transport: Arc<dyn Transport>,
}

impl GeminiBackend {
    pub fn new(settings: BackendSettings, api_key: String, transport: Arc<dyn Transport>) -> Self {
        GeminiBackend {
            settings,
            api_key,
            transport,
        }
    }
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn send(
        &self,
        conversation: &[Message],
        system_prompt: &str,
    ) -> Result<FragmentStream, ChatError> {
        let payload = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system_prompt }],
            },
            contents: conversation
                .iter()
                .map(|m| Content {
                    role: Some(match m.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }),
                    parts: vec![Part { text: &m.content }],
                })
                .collect(),
        };
        let body = serde_json::to_value(&payload).map_err(|e| ChatError::Internal(e.to_string()))?;

        let path = format!("v1beta/models/{}:streamGenerateContent?alt=sse", self.settings.model);
        let url = super::endpoint(&self.settings.base_url, &path);
        info!("Streaming {} turn(s) to Gemini model {}", conversation.len(), self.settings.model);
        let request =
            OutboundRequest::new(url, body).header("x-goog-api-key", self.api_key.as_str());
        let response = post_checked(self.transport.as_ref(), self.name(), request).await?;

        Ok(sse_fragments(response.body, chunk_text))
    }
}
