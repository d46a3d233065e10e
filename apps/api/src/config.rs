use anyhow::{Context, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite://talentscout_candidates.db";
const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";

/// Application configuration loaded from environment variables.
/// Startup fails if `GROQ_API_KEY` is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub groq_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
    /// Sessions untouched for this long are dropped.
    pub session_idle_mins: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL", DEFAULT_DATABASE_URL),
            groq_api_key: require_env("GROQ_API_KEY")?,
            llm_base_url: optional_env("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: optional_env("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_timeout_secs: optional_env("LLM_TIMEOUT_SECS", "30")
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            session_idle_mins: optional_env("SESSION_IDLE_MINS", "60")
                .parse::<u64>()
                .context("SESSION_IDLE_MINS must be a whole number of minutes")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
