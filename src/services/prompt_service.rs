use log::{info, warn};
use crate::error::ChatError;
use crate::models::file_context::FileContext;
use crate::services::document_service;

/// Upper bound on the characters one document contributes to the prompt.
pub const MAX_DOCUMENT_CHARS: usize = 50_000;

pub const SYSTEM_PROMPT: &str = "You are Legal Oracle, an expert AI legal research assistant. \
You specialize in Nigerian law, corporate law, contract law, property law, and legal research.

Your capabilities include:
- Analyzing legal documents and extracting key information
- Providing accurate legal citations and references
- Explaining complex legal concepts in clear terms
- Assisting with legal research and case analysis
- Drafting legal documents and correspondence
- Answering general legal questions even without uploaded documents

Always maintain a professional, authoritative, yet accessible tone. When citing legal sources, \
be specific and accurate. If you're uncertain about something, acknowledge it and suggest \
verification methods.

You can chat and answer legal questions even when no documents are uploaded. Be helpful and \
provide general legal guidance when documents are not available.";

const DOCUMENTS_INTRO: &str = "The user has uploaded the following documents for analysis. \
Use this context to provide more accurate and relevant responses:";

const DOCUMENTS_OUTRO: &str = "When answering questions, \
reference specific documents when relevant. \
When a statement comes from an uploaded document, cite it inline in exactly this form: \
(Source: <document name>, Page <page number>)";

/// Builds the system turn: the persona followed by one section per document.
///
/// A document whose decoder fails is replaced by a placeholder and the rest
/// are still included.
pub async fn build_system_prompt(files: &[FileContext]) -> String {
    let mut texts = Vec::with_capacity(files.len());
    for file in files {
        texts.push(extract_or_placeholder(file).await);
    }
    let prompt = assemble(files, &texts);
    info!(
        "Assembled system prompt of {} characters from {} document(s)",
        prompt.chars().count(),
        files.len()
    );
    prompt
}

/// Joins the persona and already extracted document texts, truncating each to
/// [`MAX_DOCUMENT_CHARS`]. `texts[i]` belongs to `files[i]`.
pub fn assemble(files: &[FileContext], texts: &[String]) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);
    if files.is_empty() {
        return prompt;
    }

    prompt.push_str("\n\n");
    prompt.push_str(DOCUMENTS_INTRO);
    prompt.push('\n');
    for (i, (file, text)) in files.iter().zip(texts).enumerate() {
        prompt.push_str(&format!("\n--- Document {}: {} ---\n", i + 1, file.name));
        prompt.push_str(truncate_chars(text, MAX_DOCUMENT_CHARS));
        prompt.push('\n');
    }
    prompt.push('\n');
    prompt.push_str(DOCUMENTS_OUTRO);
    prompt
}

/// Longest prefix of `text` with at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

async fn extract_or_placeholder(file: &FileContext) -> String {
    let owned = file.clone();
    // decoders are CPU bound and pdf-extract can panic on malformed input
    let result = tokio::task::spawn_blocking(move || document_service::extract_text(&owned))
        .await
        .unwrap_or_else(|e| {
            Err(ChatError::extraction(&file.name, format!("decoder crashed: {}", e)))
        });

    match result {
        Ok(text) => text,
        Err(e) => {
            warn!("Substituting placeholder for {}: {}", file.name, e);
            document_service::unreadable_placeholder(&file.name)
        }
    }
}
