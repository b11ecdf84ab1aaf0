use std::sync::Arc;
use log::info;
use crate::config::AppConfig;
use crate::error::ChatError;
use crate::models::chat_request::ChatRequest;
use crate::services::llm_service;
use crate::services::prompt_service;
use crate::services::stream_decoder::FragmentStream;
use crate::services::transport::Transport;

/// Process a chat request into a stream of reply fragments.
///
/// The conversation and the backend credential are validated before any
/// document is decoded or any request is sent. History comes only from the
/// request; nothing is kept between calls.
pub async fn process_chat(
    request: ChatRequest,
    config: &AppConfig,
    transport: Arc<dyn Transport>,
) -> Result<FragmentStream, ChatError> {
    let conversation = request.conversation()?;
    let backend =
        llm_service::select_backend(request.mode, request.api_key.as_deref(), config, transport)?;

    let system_prompt = prompt_service::build_system_prompt(&request.files).await;
    info!(
        "Relaying {} message(s) with {} document(s) to {}",
        conversation.len(),
        request.files.len(),
        backend.name()
    );
    backend.send(&conversation, &system_prompt).await
}
