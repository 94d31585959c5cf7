use crate::embedding::DEFAULT_EMBEDDING_MODEL;
use crate::llm::client::DEFAULT_CHAT_MODEL;
use std::env;

/// Environment-driven configuration.
///
/// Secrets stay in the environment; nothing here is logged.
#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub openai_model: String,
    pub embedding_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            mongodb_uri: env::var("MONGODB_URI").ok().filter(|v| !v.is_empty()),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "memora".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
        }
    }
}
