use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::app::controls::{clamp_cache_ttl, clamp_max_articles};
use crate::app::App;
use crate::strings::SUMMARY_FILE_NAME;

/// Sidebar preferences remembered between launches. Queries and summaries are never written.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SavedState {
    pub max_articles: u32,
    pub cache_ttl_minutes: u32,
    pub show_dev_tools: bool,
}

impl Default for SavedState {
    fn default() -> Self {
        Self {
            max_articles: crate::app::controls::MAX_ARTICLES_DEFAULT,
            cache_ttl_minutes: crate::app::controls::CACHE_TTL_DEFAULT,
            show_dev_tools: false,
        }
    }
}

impl From<&App> for SavedState {
    fn from(a: &App) -> Self {
        SavedState {
            max_articles: a.controls.max_articles,
            cache_ttl_minutes: a.controls.cache_ttl_minutes,
            show_dev_tools: a.show_dev_tools,
        }
    }
}

impl SavedState {
    pub fn apply(&self, app: &mut App) {
        app.controls.max_articles = clamp_max_articles(self.max_articles);
        app.controls.cache_ttl_minutes = clamp_cache_ttl(self.cache_ttl_minutes);
        app.show_dev_tools = self.show_dev_tools;
    }
}

pub fn state_path() -> Option<PathBuf> {
    Some(providers::config_file::config_dir()?.join("ui_state.json"))
}

pub fn load_state() -> Result<Option<SavedState>> {
    let Some(path) = state_path() else {
        return Ok(None);
    };
    load_state_from(&path)
}

pub fn load_state_from(path: &Path) -> Result<Option<SavedState>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(path).with_context(|| format!("read state file: {}", path.display()))?;
    let s: SavedState = serde_json::from_slice(&data).with_context(|| "parse state json")?;
    Ok(Some(s))
}

pub fn save_state(app: &App) -> Result<()> {
    let Some(path) = state_path() else {
        return Ok(());
    };
    save_state_to(&path, &app.into())
}

pub fn save_state_to(path: &Path, s: &SavedState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let data = serde_json::to_vec_pretty(s)?;
    write_atomic(path, &data)
        .with_context(|| format!("persist state to {}", path.display()))
}

/// Writes the summary as `summary.txt` under `dir`, replacing any previous download.
pub fn save_summary(dir: &Path, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create dir: {}", dir.display()))?;
    let path = dir.join(SUMMARY_FILE_NAME);
    write_atomic(&path, text.as_bytes())?;
    Ok(path)
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = path.to_path_buf();
    let ext = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    tmp.set_extension(ext);
    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("create tmp: {}", tmp.display()))?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}
