use actix_web::cookie::Key;
use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha512};
use std::env;
use std::str::FromStr;
use url::Url;

pub fn init_logging() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
}

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STATIC_DIR: &str = "./static";
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub const OLLAMA_URL: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "llama3";
pub const COHERE_URL: &str = "https://api.cohere.ai";
pub const COHERE_MODEL: &str = "command-a-03-2025";
pub const TOGETHER_URL: &str = "https://api.together.xyz";
pub const TOGETHER_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct-Turbo";
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

pub const COHERE_KEY_VAR: &str = "COHERE_API_KEY";
pub const TOGETHER_KEY_VAR: &str = "TOGETHER_API_KEY";
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

const MIN_SESSION_SECRET_LEN: usize = 32;

/// Which hosted vendor answers `mode: "cloud"` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudProvider {
    Cohere,
    Together,
    Gemini,
}

impl CloudProvider {
    /// Environment variable holding this provider's API key.
    pub fn key_var(&self) -> &'static str {
        match self {
            CloudProvider::Cohere => COHERE_KEY_VAR,
            CloudProvider::Together => TOGETHER_KEY_VAR,
            CloudProvider::Gemini => GEMINI_KEY_VAR,
        }
    }
}

impl FromStr for CloudProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cohere" => Ok(CloudProvider::Cohere),
            "together" | "togetherai" | "together_ai" => Ok(CloudProvider::Together),
            "gemini" | "google" => Ok(CloudProvider::Gemini),
            other => Err(anyhow!("Unknown CLOUD_PROVIDER '{}'", other)),
        }
    }
}

/// Connection details for one inference backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: Url,
    pub model: String,
    /// Key taken from the environment; a per-request key overrides it.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub secure_cookies: bool,
    pub static_dir: String,
    pub max_body_bytes: usize,
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,
    pub cloud_provider: CloudProvider,
    pub cohere: BackendSettings,
    pub together: BackendSettings,
    pub gemini: BackendSettings,
    pub ollama: BackendSettings,
}

impl AppConfig {
    /// Reads the configuration from the process environment (after `.env` was loaded).
    pub fn from_env() -> Result<Self> {
        let session_secret = env::var("SESSION_SECRET").unwrap_or_default();
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(anyhow!(
                "SESSION_SECRET must be at least {} characters long",
                MIN_SESSION_SECRET_LEN
            ));
        }

        let port = match env::var("PORT") {
            Ok(value) => value.parse().context("PORT must be a number")?,
            Err(_) => DEFAULT_PORT,
        };
        let max_body_bytes = match env::var("MAX_BODY_BYTES") {
            Ok(value) => value.parse().context("MAX_BODY_BYTES must be a number")?,
            Err(_) => DEFAULT_MAX_BODY_BYTES,
        };
        let cloud_provider = match env::var("CLOUD_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => CloudProvider::Cohere,
        };

        Ok(AppConfig {
            host: env_or("HOST", DEFAULT_HOST),
            port,
            session_secret,
            secure_cookies: env_or("APP_ENV", "development") == "production",
            static_dir: env_or("STATIC_DIR", DEFAULT_STATIC_DIR),
            max_body_bytes,
            admin_email: optional_env("ADMIN_EMAIL"),
            admin_password_hash: optional_env("ADMIN_PASSWORD_HASH"),
            cloud_provider,
            cohere: backend_from_env(
                "COHERE_URL",
                COHERE_URL,
                "COHERE_MODEL",
                COHERE_MODEL,
                Some(COHERE_KEY_VAR),
            )?,
            together: backend_from_env(
                "TOGETHER_URL",
                TOGETHER_URL,
                "TOGETHER_MODEL",
                TOGETHER_MODEL,
                Some(TOGETHER_KEY_VAR),
            )?,
            gemini: backend_from_env(
                "GEMINI_URL",
                GEMINI_URL,
                "GEMINI_MODEL",
                GEMINI_MODEL,
                Some(GEMINI_KEY_VAR),
            )?,
            ollama: backend_from_env(
                "OLLAMA_URL",
                OLLAMA_URL,
                "OLLAMA_MODEL",
                OLLAMA_MODEL,
                None,
            )?,
        })
    }

    /// Settings for a hosted provider.
    pub fn cloud_settings(&self, provider: CloudProvider) -> &BackendSettings {
        match provider {
            CloudProvider::Cohere => &self.cohere,
            CloudProvider::Together => &self.together,
            CloudProvider::Gemini => &self.gemini,
        }
    }

    /// Cookie encryption key. `Key` needs 64 bytes, so the secret is stretched with SHA-512.
    pub fn session_key(&self) -> Key {
        let digest = Sha512::digest(self.session_secret.as_bytes());
        Key::from(digest.as_slice())
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn backend_from_env(
    url_var: &str,
    default_url: &str,
    model_var: &str,
    default_model: &str,
    key_var: Option<&str>,
) -> Result<BackendSettings> {
    let raw_url = env_or(url_var, default_url);
    let base_url = Url::parse(&raw_url).with_context(|| format!("{} is not a valid URL", url_var))?;
    Ok(BackendSettings {
        base_url,
        model: env_or(model_var, default_model),
        api_key: key_var.and_then(optional_env),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_provider_parsing() {
        assert_eq!("Cohere".parse::<CloudProvider>().unwrap(), CloudProvider::Cohere);
        assert_eq!("together".parse::<CloudProvider>().unwrap(), CloudProvider::Together);
        assert_eq!(" gemini ".parse::<CloudProvider>().unwrap(), CloudProvider::Gemini);
        assert!("openai".parse::<CloudProvider>().is_err());
    }

    #[test]
    fn test_key_vars() {
        assert_eq!(CloudProvider::Cohere.key_var(), "COHERE_API_KEY");
        assert_eq!(CloudProvider::Gemini.key_var(), "GEMINI_API_KEY");
    }
}
