//! Article retrieval and LLM summarization behind one cached entry point.
//!
//! The interface calls [`Research::get_news_articles`] to show cards and then
//! asks for a summary of the same query. Summaries are memoised per
//! [`SummaryKey`] in a module-level [`TtlCache`]; articles are never cached.

use std::time::Duration;

use eqr_core::cache::TtlCache;
use eqr_core::llm::{ChatError, ChatOpts, Message, ModelClient};
use eqr_core::news::{Article, ArticleCard, NewsClient, NewsError, NewsQuery, SummaryKey};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config_file::FileConfig;
use crate::newsapi::{NewsApiClient, NewsApiConfig};
use crate::openai::{OpenAiClient, OpenAiConfig};

pub use eqr_core::tokens::estimate_tokens;

pub const DEFAULT_MODULE_TTL: Duration = Duration::from_secs(60 * 60 * 24);
/// Longest description quoted per article in the prompt.
const PROMPT_DESCRIPTION_CHARS: usize = 400;

pub const SYSTEM_PROMPT: &str = "You are an equity research analyst. Summarize the news \
articles you are given for an investor in concise bullet points. Cover the key themes, \
the companies and tickers involved, overall market sentiment, and notable risks or \
catalysts. Do not invent facts that are not in the articles.";

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("news: {0}")]
    News(#[from] NewsError),
    #[error("llm: {0}")]
    Llm(#[from] ChatError),
    #[error("no articles to summarize")]
    NoArticles,
    #[error("the model returned an empty summary")]
    EmptySummary,
}

pub struct Research<N, M> {
    news: N,
    llm: M,
    opts: ChatOpts,
    cache: TtlCache<SummaryKey, String>,
}

pub type LiveResearch = Research<NewsApiClient, OpenAiClient>;

impl LiveResearch {
    /// Builds the NewsAPI and OpenAI clients from the environment and config file.
    pub fn from_env() -> anyhow::Result<Self> {
        let file = FileConfig::load();
        let news = NewsApiClient::new(NewsApiConfig::from_env_with(&file)?)?;
        let llm = OpenAiClient::new(OpenAiConfig::from_env_with(&file)?)?;
        let opts = llm.default_opts();
        let ttl = file
            .cache
            .and_then(|c| c.module_ttl_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_MODULE_TTL);
        Ok(Research::new(news, llm, opts).with_cache_ttl(ttl))
    }
}

impl<N: NewsClient, M: ModelClient> Research<N, M> {
    pub fn new(news: N, llm: M, opts: ChatOpts) -> Self {
        Self {
            news,
            llm,
            opts,
            cache: TtlCache::new(DEFAULT_MODULE_TTL),
        }
    }

    pub fn with_cache_ttl(self, ttl: Duration) -> Self {
        self.cache.set_ttl(ttl);
        self
    }

    pub fn model(&self) -> &str {
        &self.opts.model
    }

    pub async fn get_news_articles(&self, q: &NewsQuery) -> Result<Vec<Article>, ResearchError> {
        Ok(self.news.fetch_articles(q).await?)
    }

    pub async fn summarize_articles_llm(
        &self,
        q: &NewsQuery,
        articles: &[Article],
    ) -> Result<String, ResearchError> {
        if articles.is_empty() {
            return Err(ResearchError::NoArticles);
        }
        let msgs = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(build_user_prompt(&q.query, articles)),
        ];
        info!(target: "research", "summarize q={:?} articles={} model={}", q.query, articles.len(), self.opts.model);
        let res = self.llm.send_chat(&msgs, &self.opts).await?;
        let text = res.text.trim().to_string();
        if text.is_empty() {
            warn!(target: "research", "empty summary finish={:?}", res.finish_reason);
            return Err(ResearchError::EmptySummary);
        }
        Ok(text)
    }

    /// Fetches and summarizes without touching the cache.
    pub async fn get_summary(&self, q: &NewsQuery) -> Result<String, ResearchError> {
        let articles = self.get_news_articles(q).await?;
        self.summarize_articles_llm(q, &articles).await
    }

    pub async fn get_summary_cached_module(&self, q: &NewsQuery) -> Result<String, ResearchError> {
        let key = q.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!(target: "research", "module cache hit q={:?}", q.query);
            return Ok(hit);
        }
        let summary = self.get_summary(q).await?;
        self.cache.insert(key, summary.clone());
        Ok(summary)
    }

    /// Same cache as [`Self::get_summary_cached_module`] for callers that already hold the articles.
    pub async fn summarize_cached(
        &self,
        q: &NewsQuery,
        articles: &[Article],
    ) -> Result<String, ResearchError> {
        let key = q.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!(target: "research", "module cache hit q={:?}", q.query);
            return Ok(hit);
        }
        let summary = self.summarize_articles_llm(q, articles).await?;
        self.cache.insert(key, summary.clone());
        Ok(summary)
    }

    pub fn clear_module_cache(&self) {
        info!(target: "research", "module cache cleared ({} entries)", self.cache.len());
        self.cache.clear();
    }

    pub fn module_cache_len(&self) -> usize {
        self.cache.len()
    }
}

pub fn build_user_prompt(query: &str, articles: &[Article]) -> String {
    let mut out = format!(
        "Research query: {}\n\nSummarize the following {} news articles.\n",
        query,
        articles.len()
    );
    for (i, a) in articles.iter().enumerate() {
        let card = ArticleCard::from_article(a);
        out.push_str(&format!("\n{}. {}\n", i + 1, card.title));
        if !card.source.is_empty() || !card.published.is_empty() {
            out.push_str(&format!("   {}\n", card.byline()));
        }
        if !card.description.is_empty() {
            let desc: String = card.description.chars().take(PROMPT_DESCRIPTION_CHARS).collect();
            out.push_str(&format!("   {}\n", desc));
        }
        if let Some(u) = &card.url {
            out.push_str(&format!("   {}\n", u));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqr_core::llm::ChatResult;
    use eqr_core::news::Source;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeNews {
        articles: Vec<Article>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeNews {
        fn with(articles: Vec<Article>) -> Self {
            Self {
                articles,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[allow(async_fn_in_trait)]
    impl NewsClient for FakeNews {
        async fn fetch_articles(&self, q: &NewsQuery) -> Result<Vec<Article>, NewsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NewsError::RateLimit("too many".into()));
            }
            Ok(self.articles.iter().take(q.max_articles as usize).cloned().collect())
        }
    }

    struct FakeLlm {
        reply: String,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl FakeLlm {
        fn replying(s: &str) -> Self {
            Self {
                reply: s.to_string(),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[allow(async_fn_in_trait)]
    impl ModelClient for FakeLlm {
        async fn send_chat(&self, msgs: &[Message], _opts: &ChatOpts) -> Result<ChatResult, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = msgs.last().map(|m| m.content.clone());
            Ok(ChatResult {
                text: self.reply.clone(),
                finish_reason: Some("stop".into()),
                prompt_tokens: None,
                completion_tokens: None,
            })
        }
    }

    fn opts() -> ChatOpts {
        ChatOpts {
            model: "test-model".into(),
            temperature: None,
            max_tokens: None,
        }
    }

    fn article(title: &str) -> Article {
        Article {
            title: Some(title.into()),
            description: Some(format!("{title} details")),
            source: Some(Source {
                id: None,
                name: Some("Wire".into()),
            }),
            published_at: Some("2024-02-01T09:00:00Z".into()),
            url: Some(format!("https://example.com/{title}")),
            ..Article::default()
        }
    }

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread().build().unwrap()
    }

    #[test]
    fn module_cache_avoids_second_fetch_and_llm_call() {
        let r = Research::new(FakeNews::with(vec![article("a")]), FakeLlm::replying(" - up "), opts());
        let q = NewsQuery::new("AAPL", 20);
        let rt = rt();
        assert_eq!(rt.block_on(r.get_summary_cached_module(&q)).unwrap(), "- up");
        assert_eq!(rt.block_on(r.get_summary_cached_module(&q)).unwrap(), "- up");
        assert_eq!(r.news.calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.module_cache_len(), 1);
    }

    #[test]
    fn different_max_articles_is_a_different_entry() {
        let r = Research::new(FakeNews::with(vec![article("a")]), FakeLlm::replying("s"), opts());
        let rt = rt();
        rt.block_on(r.get_summary_cached_module(&NewsQuery::new("AAPL", 20))).unwrap();
        rt.block_on(r.get_summary_cached_module(&NewsQuery::new("AAPL", 25))).unwrap();
        assert_eq!(r.llm.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clear_module_cache_forces_refresh() {
        let r = Research::new(FakeNews::with(vec![article("a")]), FakeLlm::replying("s"), opts());
        let q = NewsQuery::new("AAPL", 20);
        let rt = rt();
        rt.block_on(r.summarize_cached(&q, &[article("a")])).unwrap();
        r.clear_module_cache();
        assert_eq!(r.module_cache_len(), 0);
        rt.block_on(r.get_summary_cached_module(&q)).unwrap();
        assert_eq!(r.llm.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn summarize_cached_shares_the_module_cache() {
        let r = Research::new(FakeNews::with(vec![article("a")]), FakeLlm::replying("s"), opts());
        let q = NewsQuery::new("AAPL", 20);
        let rt = rt();
        rt.block_on(r.summarize_cached(&q, &[article("a")])).unwrap();
        rt.block_on(r.get_summary_cached_module(&q)).unwrap();
        assert_eq!(r.news.calls.load(Ordering::SeqCst), 0);
        assert_eq!(r.llm.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_articles_is_an_error_and_not_cached() {
        let r = Research::new(FakeNews::with(vec![]), FakeLlm::replying("s"), opts());
        let rt = rt();
        let err = rt.block_on(r.get_summary_cached_module(&NewsQuery::new("zzz", 5))).unwrap_err();
        assert!(matches!(err, ResearchError::NoArticles));
        assert_eq!(r.llm.calls.load(Ordering::SeqCst), 0);
        assert_eq!(r.module_cache_len(), 0);
    }

    #[test]
    fn blank_model_output_is_empty_summary() {
        let r = Research::new(FakeNews::with(vec![article("a")]), FakeLlm::replying("  \n"), opts());
        let err = rt().block_on(r.get_summary(&NewsQuery::new("AAPL", 5))).unwrap_err();
        assert!(matches!(err, ResearchError::EmptySummary));
    }

    #[test]
    fn news_errors_propagate() {
        let mut news = FakeNews::with(vec![]);
        news.fail = true;
        let r = Research::new(news, FakeLlm::replying("s"), opts());
        let err = rt().block_on(r.get_news_articles(&NewsQuery::new("AAPL", 5))).unwrap_err();
        assert!(matches!(err, ResearchError::News(NewsError::RateLimit(_))));
        assert_eq!(err.to_string(), "news: rate limit: too many");
    }

    #[test]
    fn prompt_lists_every_article() {
        let r = Research::new(FakeNews::with(vec![]), FakeLlm::replying("s"), opts());
        let arts = vec![article("alpha"), article("beta")];
        rt().block_on(r.summarize_articles_llm(&NewsQuery::new("chips", 5), &arts)).unwrap();
        let prompt = r.llm.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("Research query: chips"));
        assert!(prompt.contains("1. alpha"));
        assert!(prompt.contains("2. beta"));
        assert!(prompt.contains("Wire — 2024-02-01"));
        assert!(prompt.contains("https://example.com/beta"));
    }

    #[test]
    fn prompt_truncates_long_descriptions() {
        let mut a = article("long");
        a.description = Some("x".repeat(1000));
        let p = build_user_prompt("q", &[a]);
        assert!(p.contains(&"x".repeat(PROMPT_DESCRIPTION_CHARS)));
        assert!(!p.contains(&"x".repeat(PROMPT_DESCRIPTION_CHARS + 1)));
    }
}
