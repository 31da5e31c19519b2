use crate::newsapi::config::{NewsApiConfig, MAX_PAGE_SIZE};
use eqr_core::news::{Article, NewsClient, NewsError, NewsQuery};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

/// Placeholder title NewsAPI uses for articles pulled by the publisher.
const REMOVED_TITLE: &str = "[Removed]";

#[derive(Clone)]
pub struct NewsApiClient {
    http: Client,
    cfg: NewsApiConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    total_results: Option<u64>,
    #[serde(default)]
    articles: Vec<Article>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl NewsApiClient {
    pub fn new(cfg: NewsApiConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert("X-Api-Key", header::HeaderValue::from_str(&cfg.api_key)?);
        let mut builder = Client::builder()
            .default_headers(headers)
            .use_rustls_tls()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(cfg.timeout);
        if let Some(p) = &cfg.proxy {
            builder = builder.proxy(reqwest::Proxy::all(p)?);
        }
        let http = builder.build()?;
        Ok(Self { http, cfg })
    }
}

pub(crate) fn everything_url(cfg: &NewsApiConfig, q: &NewsQuery) -> Result<Url, NewsError> {
    let page_size = q.max_articles.clamp(1, MAX_PAGE_SIZE).to_string();
    let mut params: Vec<(&str, String)> = vec![
        ("q", q.query.clone()),
        ("pageSize", page_size),
        ("language", cfg.language.clone()),
        ("sortBy", cfg.sort_by.clone()),
    ];
    if let Some(d) = q.from {
        params.push(("from", d.format("%Y-%m-%d").to_string()));
    }
    if let Some(d) = q.to {
        params.push(("to", d.format("%Y-%m-%d").to_string()));
    }
    let base = format!("{}/everything", cfg.base_url.trim_end_matches('/'));
    Url::parse_with_params(&base, &params).map_err(|e| NewsError::Other(e.to_string()))
}

pub(crate) fn parse_everything(body: &str, max_articles: u32) -> Result<Vec<Article>, NewsError> {
    let resp: EverythingResponse =
        serde_json::from_str(body).map_err(|e| NewsError::Decode(e.to_string()))?;
    if resp.status != "ok" {
        let code = resp.code.unwrap_or_else(|| "unknown".into());
        let message = resp.message.unwrap_or_default();
        return Err(match code.as_str() {
            "apiKeyInvalid" | "apiKeyMissing" | "apiKeyDisabled" | "apiKeyExhausted" => {
                NewsError::Auth(message)
            }
            "rateLimited" => NewsError::RateLimit(message),
            _ => NewsError::Api { code, message },
        });
    }
    info!(
        target: "providers::newsapi",
        "everything ok total_results={:?} returned={}",
        resp.total_results,
        resp.articles.len()
    );
    Ok(resp
        .articles
        .into_iter()
        .filter(|a| a.title.as_deref() != Some(REMOVED_TITLE))
        .take(max_articles as usize)
        .collect())
}

#[allow(async_fn_in_trait)]
impl NewsClient for NewsApiClient {
    async fn fetch_articles(&self, q: &NewsQuery) -> Result<Vec<Article>, NewsError> {
        let url = everything_url(&self.cfg, q)?;
        info!(target: "providers::newsapi", "fetch q={:?} max={} from={:?} to={:?}", q.query, q.max_articles, q.from, q.to);
        let resp = self.http.get(url).send().await.map_err(map_reqwest_err)?;
        let status = resp.status();
        let body = resp.text().await.map_err(map_reqwest_err)?;
        if !status.is_success() {
            error!(target: "providers::newsapi", "non-200 status={} body={:?}", status, body);
            // NewsAPI error bodies carry a code; prefer it over the bare status.
            return match parse_everything(&body, q.max_articles) {
                Err(e @ (NewsError::Auth(_) | NewsError::RateLimit(_) | NewsError::Api { .. })) => Err(e),
                _ => Err(map_status_err(status, Some(body))),
            };
        }
        let articles = parse_everything(&body, q.max_articles)?;
        if articles.is_empty() {
            warn!(target: "providers::newsapi", "no articles for q={:?}", q.query);
        }
        Ok(articles)
    }
}

fn map_reqwest_err(e: reqwest::Error) -> NewsError {
    if e.is_timeout() {
        NewsError::Timeout(e.to_string())
    } else if e.is_request() || e.is_connect() {
        NewsError::Network(e.to_string())
    } else {
        NewsError::Other(e.to_string())
    }
}

fn map_status_err(status: StatusCode, body: Option<String>) -> NewsError {
    let s = format!("{} {}", status.as_u16(), body.unwrap_or_default());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NewsError::Auth(s),
        StatusCode::TOO_MANY_REQUESTS => NewsError::RateLimit(s),
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => NewsError::Network(s),
        _ => NewsError::Other(s),
    }
}
