use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref DATA_URL: Regex = Regex::new(r"(?s)^data:([^;,]*)(?:;[^,]*)?;base64,(.*)$").unwrap();
}

/// An uploaded document as the browser sends it.
///
/// `content` holds either plain text or a `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
}

/// Decoded body of a base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileContext {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        FileContext {
            name: name.into(),
            content: content.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn is_data_url(&self) -> bool {
        self.content.starts_with("data:")
    }

    /// Case-insensitive extension check, `ext` given with its dot.
    pub fn has_extension(&self, ext: &str) -> bool {
        self.name.to_lowercase().ends_with(ext)
    }

    /// Decodes the data URL payload. `Ok(None)` when the content is not a base64 data URL.
    pub fn decode_data_url(&self) -> Result<Option<DataUrl>, base64::DecodeError> {
        let captures = match DATA_URL.captures(&self.content) {
            Some(c) => c,
            None => return Ok(None),
        };
        let mime_type = captures
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.mime_type.to_lowercase());
        let payload: String = captures[2].chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD.decode(payload)?;
        Ok(Some(DataUrl { mime_type, bytes }))
    }
}
