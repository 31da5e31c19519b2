use directories::BaseDirs;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::warn;

pub const APP_DIR: &str = "equity-research";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OpenAiFileConfig {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewsApiFileConfig {
    pub language: Option<String>,
    pub sort_by: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CacheFileConfig {
    pub module_ttl_secs: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UiFileConfig {
    pub default_max_articles: Option<u32>,
    pub default_cache_ttl_minutes: Option<u32>,
    pub download_dir: Option<PathBuf>,
}

/// Contents of `config.toml`. Every table is optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FileConfig {
    pub openai: Option<OpenAiFileConfig>,
    pub newsapi: Option<NewsApiFileConfig>,
    pub cache: Option<CacheFileConfig>,
    pub ui: Option<UiFileConfig>,
}

impl FileConfig {
    /// Reads the user's config file. A missing or malformed file yields defaults.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(s) => Self::parse(&s).unwrap_or_else(|e| {
                warn!(target: "config", "ignoring {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                warn!(target: "config", "cannot read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

pub fn config_dir() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    let p = if cfg!(target_os = "windows") {
        base.home_dir().join(format!(".{APP_DIR}"))
    } else {
        base.config_dir().join(APP_DIR)
    };
    Some(p)
}

pub fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.toml"))
}
