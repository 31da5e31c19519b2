use crate::config_file::FileConfig;
use std::{env, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
/// Largest `pageSize` the `/everything` endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug)]
pub struct NewsApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub sort_by: String,
    pub timeout: Duration,
    pub proxy: Option<String>,
}

impl NewsApiConfig {
    pub fn from_env_and_file() -> anyhow::Result<Self> {
        Self::from_env_with(&FileConfig::load())
    }

    pub fn from_env_with(file: &FileConfig) -> anyhow::Result<Self> {
        let api_key =
            env::var("NEWSAPI_KEY").map_err(|_| anyhow::anyhow!("NEWSAPI_KEY not set"))?;
        let base_url = env::var("NEWSAPI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let f = file.newsapi.clone().unwrap_or_default();
        let proxy = env::var("HTTPS_PROXY")
            .ok()
            .or_else(|| env::var("HTTP_PROXY").ok());

        Ok(NewsApiConfig {
            api_key,
            base_url,
            language: f.language.unwrap_or_else(|| "en".to_string()),
            sort_by: f.sort_by.unwrap_or_else(|| "publishedAt".to_string()),
            timeout: Duration::from_millis(f.timeout_ms.unwrap_or(30_000)),
            proxy,
        })
    }
}
