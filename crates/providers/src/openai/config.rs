use crate::config_file::FileConfig;
use std::{env, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub proxy: Option<String>,
}

impl OpenAiConfig {
    pub fn from_env_and_file() -> anyhow::Result<Self> {
        Self::from_env_with(&FileConfig::load())
    }

    pub fn from_env_with(file: &FileConfig) -> anyhow::Result<Self> {
        let api_key =
            env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
        let base_url = env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut model = DEFAULT_MODEL.to_string();
        let mut temperature = Some(0.2f32);
        let mut max_tokens = Some(700u32);
        let mut timeout_ms = 60_000u64;

        if let Some(f) = &file.openai {
            if let Some(m) = &f.model {
                model = m.clone();
            }
            if let Some(t) = f.temperature {
                temperature = Some(t);
            }
            if let Some(m) = f.max_tokens {
                max_tokens = Some(m);
            }
            if let Some(t) = f.timeout_ms {
                timeout_ms = t;
            }
        }

        let proxy = env::var("HTTPS_PROXY")
            .ok()
            .or_else(|| env::var("HTTP_PROXY").ok());

        Ok(OpenAiConfig {
            api_key,
            base_url,
            model,
            temperature,
            max_tokens,
            timeout: Duration::from_millis(timeout_ms),
            proxy,
        })
    }
}
