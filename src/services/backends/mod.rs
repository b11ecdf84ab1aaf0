//! One `InferenceBackend` per vendor wire protocol.

pub mod cohere;
pub mod gemini;
pub mod ollama;
pub mod together;

use url::Url;

/// `path` under a configured base URL, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
}
