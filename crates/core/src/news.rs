use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One article as returned by the news API. Every field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    /// Older feeds send `published` instead of `publishedAt`.
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Article {
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct NewsQuery {
    pub query: String,
    pub max_articles: u32,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Identity of a summary in both the interface cache and the module cache.
pub type SummaryKey = NewsQuery;

impl NewsQuery {
    pub fn new<S: AsRef<str>>(query: S, max_articles: u32) -> Self {
        Self {
            query: query.as_ref().trim().to_string(),
            max_articles,
            from: None,
            to: None,
        }
    }

    pub fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn cache_key(&self) -> SummaryKey {
        self.clone()
    }
}

/// Display-ready view of an [`Article`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArticleCard {
    pub title: String,
    pub url: Option<String>,
    pub source: String,
    pub published: String,
    pub description: String,
}

pub const NO_TITLE: &str = "<no title>";

impl ArticleCard {
    pub fn from_article(a: &Article) -> Self {
        let title = a
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(NO_TITLE)
            .to_string();
        let published = a
            .published_at
            .as_deref()
            .filter(|p| !p.is_empty())
            .or(a.published.as_deref())
            .map(format_published)
            .unwrap_or_default();
        Self {
            title,
            url: a.url.clone().filter(|u| !u.is_empty()),
            source: a.source_name().unwrap_or("").to_string(),
            published,
            description: a.description.clone().unwrap_or_default(),
        }
    }

    /// Second card line, e.g. `Reuters — 2024-05-01`.
    pub fn byline(&self) -> String {
        format!("{} — {}", self.source, self.published)
    }
}

/// ISO 8601 timestamps, with or without an offset, become `2024-05-01`;
/// anything unparsable is kept as is.
pub fn format_published(raw: &str) -> String {
    let t = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return d.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("auth error: {0}")] Auth(String),
    #[error("rate limit: {0}")] RateLimit(String),
    #[error("timeout: {0}")] Timeout(String),
    #[error("network: {0}")] Network(String),
    #[error("decode: {0}")] Decode(String),
    #[error("api error {code}: {message}")] Api { code: String, message: String },
    #[error("other: {0}")] Other(String),
}

#[allow(async_fn_in_trait)]
pub trait NewsClient: Send + Sync {
    async fn fetch_articles(&self, q: &NewsQuery) -> Result<Vec<Article>, NewsError>;
}
