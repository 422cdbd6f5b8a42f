use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every setting has a default: the service boots against a local Ollama
/// with the scraper's CSV in the working directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: String,
    pub index_path: String,
    pub ollama_url: String,
    pub generation_model: String,
    pub embedding_model: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            catalog_path: env_or("CATALOG_PATH", "assessments_catalog.csv"),
            index_path: env_or("INDEX_PATH", "assessment_index.json"),
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434"),
            generation_model: env_or("GENERATION_MODEL", "llama3.2"),
            embedding_model: env_or("EMBEDDING_MODEL", "mxbai-embed-large"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
