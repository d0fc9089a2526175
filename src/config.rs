use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_base_url: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub generation_batch_cap: usize,
    pub answer_tolerance: f64,
    pub cors_allowed_origins: Vec<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            llm_api_key: get_env("LLM_API_KEY")?,
            llm_model: get_env_or("LLM_MODEL", "claude-opus-4-20250514"),
            llm_base_url: get_env_or("LLM_BASE_URL", "https://api.anthropic.com"),
            llm_max_tokens: get_env_parse_or("LLM_MAX_TOKENS", 8000)?,
            llm_temperature: get_env_parse_or("LLM_TEMPERATURE", 0.4)?,
            llm_timeout_secs: get_env_parse_or("LLM_TIMEOUT_SECS", 120)?,
            generation_batch_cap: get_env_parse_or("GENERATION_BATCH_CAP", 5)?,
            answer_tolerance: get_env_parse_or("ANSWER_TOLERANCE", 0.001)?,
            cors_allowed_origins: get_env_or("CORS_ALLOWED_ORIGINS", "")
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_to_default_when_unset() {
        let value: u64 = get_env_parse_or("MATH_QUIZ_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_or_rejects_garbage() {
        env::set_var("MATH_QUIZ_TEST_BAD_NUMBER", "twelve");
        let result: Result<u32> = get_env_parse_or("MATH_QUIZ_TEST_BAD_NUMBER", 1);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("MATH_QUIZ_TEST_BAD_NUMBER")));
    }
}
