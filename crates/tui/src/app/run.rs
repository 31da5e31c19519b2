//! The fetch-and-summarize cycle behind the Run button.
//!
//! A run executes on its own thread and reports back over a channel, so the
//! event loop keeps drawing the spinner. Events arrive in display order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use eqr_core::cache::TtlCache;
use eqr_core::news::{Article, NewsQuery, SummaryKey};
use eqr_core::tokens::{article_digest, estimate_tokens};
use providers::{LiveResearch, ResearchError};
use tracing::{error, info};

pub type UiCache = TtlCache<SummaryKey, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum RunPhase {
    Idle,
    Fetching,
    Summarizing,
}

#[derive(Clone, Debug)]
pub enum RunEvent {
    Phase(RunPhase),
    FetchFailed(String),
    Articles(Vec<Article>),
    Tokens(usize),
    SummaryFailed(String),
    Summary(String),
    Finished,
}

/// Blocking view of the research service, callable from a worker thread.
pub trait Backend: Send + Sync {
    fn fetch_articles(&self, q: &NewsQuery) -> Result<Vec<Article>, ResearchError>;
    fn summarize(&self, q: &NewsQuery, articles: &[Article]) -> Result<String, ResearchError>;
    fn clear_module_cache(&self);
    fn module_cache_len(&self) -> usize;
    fn label(&self) -> String;
}

pub struct LiveBackend {
    rt: tokio::runtime::Runtime,
    research: LiveResearch,
}

impl LiveBackend {
    pub fn from_env() -> anyhow::Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let research = LiveResearch::from_env()?;
        Ok(Self { rt, research })
    }
}

impl Backend for LiveBackend {
    fn fetch_articles(&self, q: &NewsQuery) -> Result<Vec<Article>, ResearchError> {
        self.rt.block_on(self.research.get_news_articles(q))
    }

    fn summarize(&self, q: &NewsQuery, articles: &[Article]) -> Result<String, ResearchError> {
        self.rt.block_on(self.research.summarize_cached(q, articles))
    }

    fn clear_module_cache(&self) {
        self.research.clear_module_cache();
    }

    fn module_cache_len(&self) -> usize {
        self.research.module_cache_len()
    }

    fn label(&self) -> String {
        format!("NewsAPI + {}", self.research.model())
    }
}

/// Runs one cycle to completion, consulting `ui_cache` before the backend for the summary.
pub fn execute_run(
    backend: &dyn Backend,
    ui_cache: &UiCache,
    q: &NewsQuery,
    cancel: &AtomicBool,
    tx: &Sender<RunEvent>,
) {
    info!(target: "tui", "run start q={:?} max={}", q.query, q.max_articles);
    let _ = tx.send(RunEvent::Phase(RunPhase::Fetching));
    let articles = match backend.fetch_articles(q) {
        Ok(a) => a,
        Err(e) => {
            error!(target: "tui", "news fetch failed: {}", e);
            let _ = tx.send(RunEvent::FetchFailed(e.to_string()));
            Vec::new()
        }
    };
    if cancel.load(Ordering::Relaxed) {
        info!(target: "tui", "run canceled after fetch");
        return;
    }
    let _ = tx.send(RunEvent::Articles(articles.clone()));
    if articles.is_empty() {
        let _ = tx.send(RunEvent::Finished);
        return;
    }

    let _ = tx.send(RunEvent::Tokens(estimate_tokens(&article_digest(&articles))));

    let _ = tx.send(RunEvent::Phase(RunPhase::Summarizing));
    let key = q.cache_key();
    let summary = match ui_cache.get(&key) {
        Some(hit) => {
            info!(target: "tui", "ui cache hit q={:?}", q.query);
            Ok(hit)
        }
        None => backend.summarize(q, &articles).map(|s| {
            ui_cache.insert(key, s.clone());
            s
        }),
    };
    if cancel.load(Ordering::Relaxed) {
        info!(target: "tui", "run canceled after summary");
        return;
    }
    match summary {
        Ok(s) => {
            let _ = tx.send(RunEvent::Summary(s));
        }
        Err(e) => {
            error!(target: "tui", "summarization failed: {}", e);
            let _ = tx.send(RunEvent::SummaryFailed(e.to_string()));
        }
    }
    let _ = tx.send(RunEvent::Finished);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use eqr_core::llm::ChatError;
    use eqr_core::news::NewsError;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    /// Scripted backend shared with the app tests.
    pub struct FakeBackend {
        pub articles: Result<Vec<Article>, String>,
        pub summary: Result<String, String>,
        pub fetches: AtomicUsize,
        pub summaries: AtomicUsize,
        pub module_clears: AtomicUsize,
    }

    impl FakeBackend {
        pub fn new(articles: Vec<Article>, summary: &str) -> Self {
            Self {
                articles: Ok(articles),
                summary: Ok(summary.to_string()),
                fetches: AtomicUsize::new(0),
                summaries: AtomicUsize::new(0),
                module_clears: AtomicUsize::new(0),
            }
        }
    }

    impl Backend for FakeBackend {
        fn fetch_articles(&self, _q: &NewsQuery) -> Result<Vec<Article>, ResearchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.articles
                .clone()
                .map_err(|e| ResearchError::News(NewsError::Network(e)))
        }

        fn summarize(&self, _q: &NewsQuery, _articles: &[Article]) -> Result<String, ResearchError> {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            self.summary
                .clone()
                .map_err(|e| ResearchError::Llm(ChatError::RateLimit(e)))
        }

        fn clear_module_cache(&self) {
            self.module_clears.fetch_add(1, Ordering::SeqCst);
        }

        fn module_cache_len(&self) -> usize {
            0
        }

        fn label(&self) -> String {
            "fake".into()
        }
    }

    pub fn article(title: &str) -> Article {
        Article {
            title: Some(title.to_string()),
            description: Some("desc".to_string()),
            ..Article::default()
        }
    }

    fn collect(backend: &FakeBackend, cache: &UiCache, q: &NewsQuery) -> Vec<RunEvent> {
        let (tx, rx) = mpsc::channel();
        execute_run(backend, cache, q, &AtomicBool::new(false), &tx);
        drop(tx);
        rx.iter().collect()
    }

    fn cache() -> UiCache {
        TtlCache::new(Duration::from_secs(3600))
    }

    #[test]
    fn happy_path_event_order() {
        let b = FakeBackend::new(vec![article("a"), article("b")], "summary");
        let evs = collect(&b, &cache(), &NewsQuery::new("AAPL", 20));
        let kinds: Vec<&str> = evs
            .iter()
            .map(|e| match e {
                RunEvent::Phase(RunPhase::Fetching) => "fetching",
                RunEvent::Phase(RunPhase::Summarizing) => "summarizing",
                RunEvent::Phase(RunPhase::Idle) => "idle",
                RunEvent::FetchFailed(_) => "fetch_failed",
                RunEvent::Articles(_) => "articles",
                RunEvent::Tokens(_) => "tokens",
                RunEvent::SummaryFailed(_) => "summary_failed",
                RunEvent::Summary(_) => "summary",
                RunEvent::Finished => "finished",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["fetching", "articles", "tokens", "summarizing", "summary", "finished"]
        );
        // "a — desc\n\nb — desc" is 18 characters
        assert!(evs.iter().any(|e| matches!(e, RunEvent::Tokens(5))));
    }

    #[test]
    fn fetch_failure_reports_then_ends_with_no_articles() {
        let mut b = FakeBackend::new(vec![], "unused");
        b.articles = Err("connection refused".into());
        let evs = collect(&b, &cache(), &NewsQuery::new("AAPL", 20));
        assert!(matches!(&evs[1], RunEvent::FetchFailed(m) if m.contains("connection refused")));
        assert!(matches!(&evs[2], RunEvent::Articles(a) if a.is_empty()));
        assert!(matches!(evs.last(), Some(RunEvent::Finished)));
        assert_eq!(b.summaries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn summary_failure_is_reported() {
        let mut b = FakeBackend::new(vec![article("a")], "unused");
        b.summary = Err("quota".into());
        let evs = collect(&b, &cache(), &NewsQuery::new("AAPL", 20));
        assert!(evs
            .iter()
            .any(|e| matches!(e, RunEvent::SummaryFailed(m) if m == "llm: rate limit: quota")));
        assert!(!evs.iter().any(|e| matches!(e, RunEvent::Summary(_))));
    }

    #[test]
    fn ui_cache_short_circuits_backend_summary() {
        let b = FakeBackend::new(vec![article("a")], "fresh");
        let c = cache();
        let q = NewsQuery::new("AAPL", 20);
        collect(&b, &c, &q);
        let evs = collect(&b, &c, &q);
        assert_eq!(b.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(b.summaries.load(Ordering::SeqCst), 1);
        assert!(evs.iter().any(|e| matches!(e, RunEvent::Summary(s) if s == "fresh")));
    }

    #[test]
    fn failed_summaries_are_not_cached() {
        let mut b = FakeBackend::new(vec![article("a")], "unused");
        b.summary = Err("quota".into());
        let c = cache();
        collect(&b, &c, &NewsQuery::new("AAPL", 20));
        assert!(c.is_empty());
    }

    #[test]
    fn cancel_suppresses_late_events() {
        let b = FakeBackend::new(vec![article("a")], "s");
        let (tx, rx) = mpsc::channel();
        execute_run(&b, &cache(), &NewsQuery::new("AAPL", 20), &AtomicBool::new(true), &tx);
        drop(tx);
        let evs: Vec<RunEvent> = rx.iter().collect();
        assert_eq!(evs.len(), 1);
        assert!(matches!(evs[0], RunEvent::Phase(RunPhase::Fetching)));
    }
}
