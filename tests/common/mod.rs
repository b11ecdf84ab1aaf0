use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use legal_oracle::config::{AppConfig, BackendSettings, CloudProvider};
use legal_oracle::error::ChatError;
use legal_oracle::services::auth_service;
use legal_oracle::services::transport::{OutboundRequest, Transport, TransportResponse};
use url::Url;

pub const ADMIN_EMAIL: &str = "admin@legaloracle.ng";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

fn settings(url: &str) -> BackendSettings {
    BackendSettings {
        base_url: Url::parse(url).unwrap(),
        model: "test-model".to_string(),
        api_key: None,
    }
}

/// Configuration with a known admin and no cloud credentials.
pub fn test_config() -> AppConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        session_secret: "a-test-secret-that-is-long-enough-for-sessions".to_string(),
        secure_cookies: false,
        static_dir: "./static".to_string(),
        max_body_bytes: 1024 * 1024,
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password_hash: Some(auth_service::hash_password(ADMIN_PASSWORD).unwrap()),
        cloud_provider: CloudProvider::Cohere,
        cohere: settings("https://api.cohere.ai"),
        together: settings("https://api.together.xyz"),
        gemini: settings("https://generativelanguage.googleapis.com"),
        ollama: settings("http://localhost:11434"),
    }
}

/// Answers every request with the same NDJSON chunks and counts the calls.
pub struct CannedTransport {
    pub calls: AtomicUsize,
    chunks: Vec<&'static str>,
}

impl CannedTransport {
    pub fn new(chunks: Vec<&'static str>) -> Arc<Self> {
        Arc::new(CannedTransport {
            calls: AtomicUsize::new(0),
            chunks,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CannedTransport {
    async fn post(&self, _request: OutboundRequest) -> Result<TransportResponse, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let chunks: Vec<Result<Bytes, ChatError>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        Ok(TransportResponse {
            status: 200,
            body: Box::pin(stream::iter(chunks)),
        })
    }
}
