use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use eqr_core::history::SessionHistory;
use eqr_core::news::{Article, NewsQuery};
use providers::config_file::FileConfig;
use ratatui::layout::Rect;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{error, info, warn};

use crate::strings;

pub mod controls;
pub mod history;
pub mod input;
pub mod run;

use controls::{clamp_cache_ttl, clamp_max_articles, Controls};
use run::{Backend, LiveBackend, RunEvent, RunPhase, UiCache};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Focus {
    Query,
    MaxArticles,
    DateFrom,
    DateTo,
    CacheTtl,
    RunButton,
    ClearButton,
    History,
    DevTools,
}

impl Focus {
    pub fn label(&self) -> &'static str {
        match self {
            Focus::Query => "Query",
            Focus::MaxArticles => "Max articles",
            Focus::DateFrom => "From",
            Focus::DateTo => "To",
            Focus::CacheTtl => "Cache TTL",
            Focus::RunButton => "Run",
            Focus::ClearButton => "Clear caches",
            Focus::History => "Recent",
            Focus::DevTools => "Dev tools",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Focus::Query | Focus::DateFrom | Focus::DateTo)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// One block of the results pane, in the order it was produced.
#[derive(Clone, Debug)]
pub enum Section {
    Notice(Notice),
    Articles { query: String, articles: Vec<Article> },
    Summary(String),
}

#[derive(Clone, Debug, Default)]
pub struct AppOptions {
    pub query: Option<String>,
    pub max_articles: Option<u32>,
    pub debug: bool,
}

pub struct App {
    pub controls: Controls,
    pub focus: Focus,
    pub history: SessionHistory,
    pub history_selected: usize,
    pub sections: Vec<Section>,
    pub phase: RunPhase,
    pub run_query: Option<NewsQuery>,
    run_rx: Option<Receiver<RunEvent>>,
    run_cancel: Option<Arc<AtomicBool>>,
    pub backend: Option<Arc<dyn Backend>>,
    pub backend_error: Option<String>,
    pub ui_cache: Arc<UiCache>,
    pub show_dev_tools: bool,
    pub show_help: bool,
    pub debug: bool,
    pub download_dir: PathBuf,
    pub should_quit: bool,
    pub dirty: bool,
    pub tick: u64,
    pub results_scroll: u16,
    pub results_viewport: u16,
    pub results_area: Option<Rect>,
    pub history_area: Option<Rect>,
    persist_prefs: bool,
}

/// Serializable view of the session for the debug dump.
#[derive(Serialize)]
pub struct SessionSnapshot<'a> {
    pub phase: RunPhase,
    pub focus: Focus,
    pub run_query: Option<&'a NewsQuery>,
    pub sections: usize,
    pub ui_cache_entries: usize,
    pub show_dev_tools: bool,
    pub controls: &'a Controls,
    pub history: &'a SessionHistory,
}

impl App {
    /// Builds the live app: config file, saved preferences and real API clients.
    pub fn new(opts: AppOptions) -> Self {
        let file = FileConfig::load();
        let (backend, backend_error) = match LiveBackend::from_env() {
            Ok(b) => (Some(Arc::new(b) as Arc<dyn Backend>), None),
            Err(e) => {
                warn!(target: "tui", "backend unavailable: {:#}", e);
                (None, Some(format!("{:#}", e)))
            }
        };
        let mut s = Self::with_backend(backend, AppOptions::default());
        s.backend_error = backend_error;
        s.persist_prefs = true;
        if let Some(ui) = file.ui {
            if let Some(n) = ui.default_max_articles {
                s.controls.max_articles = clamp_max_articles(n);
            }
            if let Some(t) = ui.default_cache_ttl_minutes {
                s.controls.cache_ttl_minutes = clamp_cache_ttl(t);
            }
            if let Some(d) = ui.download_dir {
                s.download_dir = d;
            }
        }
        match crate::persist::load_state() {
            Ok(Some(p)) => p.apply(&mut s),
            Ok(None) => {}
            Err(e) => warn!(target: "tui", "ignoring saved ui state: {:#}", e),
        }
        s.apply_options(opts);
        s
    }

    /// App without disk access; `backend` None behaves like missing API keys.
    pub fn with_backend(backend: Option<Arc<dyn Backend>>, opts: AppOptions) -> Self {
        let controls = Controls::default();
        let ui_cache = Arc::new(UiCache::new(controls.cache_ttl()));
        let mut s = Self {
            controls,
            focus: Focus::Query,
            history: SessionHistory::new(),
            history_selected: 0,
            sections: Vec::new(),
            phase: RunPhase::Idle,
            run_query: None,
            run_rx: None,
            run_cancel: None,
            backend,
            backend_error: None,
            ui_cache,
            show_dev_tools: false,
            show_help: false,
            debug: false,
            download_dir: PathBuf::from("."),
            should_quit: false,
            dirty: true,
            tick: 0,
            results_scroll: 0,
            results_viewport: 0,
            results_area: None,
            history_area: None,
            persist_prefs: false,
        };
        s.apply_options(opts);
        s
    }

    fn apply_options(&mut self, opts: AppOptions) {
        if let Some(q) = opts.query {
            self.controls.query.set(q);
        }
        if let Some(n) = opts.max_articles {
            self.controls.max_articles = clamp_max_articles(n);
        }
        self.debug |= opts.debug;
    }

    pub fn save_prefs(&self) {
        if !self.persist_prefs {
            return;
        }
        if let Err(e) = crate::persist::save_state(self) {
            warn!(target: "tui", "save ui state failed: {:#}", e);
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_rx.is_some()
    }

    pub fn push_notice<S: Into<String>>(&mut self, level: NoticeLevel, text: S) {
        self.sections.push(Section::Notice(Notice {
            level,
            text: text.into(),
        }));
        self.dirty = true;
    }

    pub fn current_summary(&self) -> Option<&str> {
        self.sections.iter().rev().find_map(|s| match s {
            Section::Summary(t) => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![
            Focus::Query,
            Focus::MaxArticles,
            Focus::DateFrom,
            Focus::DateTo,
            Focus::CacheTtl,
            Focus::RunButton,
            Focus::ClearButton,
        ];
        if !self.history.is_empty() {
            order.push(Focus::History);
        }
        if self.show_dev_tools {
            order.push(Focus::DevTools);
        }
        order
    }

    fn cycle_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        self.focus = match order.iter().position(|f| *f == self.focus) {
            Some(pos) if forward => order[(pos + 1) % order.len()],
            Some(pos) => order[(pos + order.len() - 1) % order.len()],
            None => Focus::Query,
        };
    }

    /// The Run button: validate the sidebar, reset the results pane and start a worker.
    pub fn start_run(&mut self) {
        if self.is_running() {
            self.push_notice(NoticeLevel::Info, strings::RUN_IN_PROGRESS);
            return;
        }
        self.sections.clear();
        self.results_scroll = 0;
        self.dirty = true;
        let q = match self.controls.build_query() {
            Ok(q) => q,
            Err(e) => {
                self.push_notice(NoticeLevel::Warning, e.to_string());
                return;
            }
        };
        let Some(backend) = self.backend.clone() else {
            let msg = self
                .backend_error
                .clone()
                .unwrap_or_else(|| "API clients are not configured".to_string());
            self.push_notice(NoticeLevel::Error, strings::config_error(&msg));
            return;
        };
        self.ui_cache.set_ttl(self.controls.cache_ttl());

        let (tx, rx) = mpsc::channel::<RunEvent>();
        let cancel = Arc::new(AtomicBool::new(false));
        let cache = self.ui_cache.clone();
        let worker_q = q.clone();
        let worker_cancel = cancel.clone();
        std::thread::spawn(move || {
            run::execute_run(backend.as_ref(), &cache, &worker_q, &worker_cancel, &tx);
        });
        info!(target: "tui", "submit: q={:?} max={} ttl_min={}", q.query, q.max_articles, self.controls.cache_ttl_minutes);
        self.run_query = Some(q);
        self.phase = RunPhase::Fetching;
        self.run_rx = Some(rx);
        self.run_cancel = Some(cancel);
    }

    pub fn cancel_run(&mut self) {
        if let Some(c) = self.run_cancel.take() {
            c.store(true, Ordering::Relaxed);
        }
        if self.run_rx.take().is_some() {
            info!(target: "tui", "run canceled by user");
            self.phase = RunPhase::Idle;
            self.push_notice(NoticeLevel::Warning, strings::RUN_CANCELED);
        }
    }

    pub fn clear_all_caches(&mut self) {
        self.ui_cache.clear();
        if let Some(b) = &self.backend {
            b.clear_module_cache();
        }
        info!(target: "tui", "cleared ui and module caches");
        self.push_notice(NoticeLevel::Success, strings::CLEARED_ALL);
    }

    pub fn clear_ui_cache(&mut self) {
        self.ui_cache.clear();
        info!(target: "tui", "cleared ui cache");
        self.push_notice(NoticeLevel::Success, strings::CLEARED_UI);
    }

    pub fn module_cache_len(&self) -> usize {
        self.backend.as_ref().map(|b| b.module_cache_len()).unwrap_or(0)
    }

    pub fn save_summary(&mut self) {
        let Some(summary) = self.current_summary().map(str::to_string) else {
            self.push_notice(NoticeLevel::Warning, strings::NOTHING_TO_DOWNLOAD);
            return;
        };
        match crate::persist::save_summary(&self.download_dir, &summary) {
            Ok(path) => {
                info!(target: "tui", "summary saved to {}", path.display());
                self.push_notice(
                    NoticeLevel::Success,
                    format!("Saved summary to {}", path.display()),
                );
            }
            Err(e) => {
                error!(target: "tui", "summary save failed: {:#}", e);
                self.push_notice(NoticeLevel::Error, format!("Failed to save summary: {:#}", e));
            }
        }
    }

    pub fn toggle_dev_tools(&mut self) {
        self.show_dev_tools = !self.show_dev_tools;
        if !self.show_dev_tools && self.focus == Focus::DevTools {
            self.focus = Focus::Query;
        }
        self.save_prefs();
    }

    pub fn scroll_results(&mut self, delta: i32) {
        let next = self.results_scroll as i32 + delta;
        self.results_scroll = next.clamp(0, u16::MAX as i32) as u16;
        self.dirty = true;
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            phase: self.phase,
            focus: self.focus,
            run_query: self.run_query.as_ref(),
            sections: self.sections.len(),
            ui_cache_entries: self.ui_cache.len(),
            show_dev_tools: self.show_dev_tools,
            controls: &self.controls,
            history: &self.history,
        }
    }

    pub fn on_paste(&mut self, s: &str) {
        match self.focus {
            Focus::Query => self.controls.query.insert_text(s),
            Focus::DateFrom => self.controls.date_from.insert_text(s),
            Focus::DateTo => self.controls.date_to.insert_text(s),
            _ => return,
        }
        self.dirty = true;
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.dirty = true;
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                self.show_help = false;
            }
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                if self.is_running() {
                    self.cancel_run();
                } else {
                    self.should_quit = true;
                }
                return;
            }
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::F(1) => {
                self.show_help = true;
                return;
            }
            KeyCode::F(12) => {
                self.toggle_dev_tools();
                return;
            }
            KeyCode::Char('r') if ctrl => {
                self.start_run();
                return;
            }
            KeyCode::Char('s') if ctrl => {
                self.save_summary();
                return;
            }
            KeyCode::Tab => {
                self.cycle_focus(true);
                return;
            }
            KeyCode::BackTab => {
                self.cycle_focus(false);
                return;
            }
            KeyCode::Home if ctrl => {
                self.results_scroll = 0;
                return;
            }
            KeyCode::End if ctrl => {
                self.results_scroll = u16::MAX;
                return;
            }
            KeyCode::PageUp if self.focus != Focus::CacheTtl => {
                self.scroll_results(-(self.results_viewport.max(1) as i32));
                return;
            }
            KeyCode::PageDown if self.focus != Focus::CacheTtl => {
                self.scroll_results(self.results_viewport.max(1) as i32);
                return;
            }
            _ => {}
        }
        self.on_focused_key(key);
    }

    fn on_focused_key(&mut self, key: KeyEvent) {
        let activate = matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));
        match self.focus {
            Focus::Query | Focus::DateFrom | Focus::DateTo => {
                if key.code == KeyCode::Enter {
                    self.start_run();
                    return;
                }
                let field = match self.focus {
                    Focus::Query => &mut self.controls.query,
                    Focus::DateFrom => &mut self.controls.date_from,
                    _ => &mut self.controls.date_to,
                };
                field.handle_key(key);
            }
            Focus::MaxArticles => match key.code {
                KeyCode::Left | KeyCode::Down => self.step_max_articles(-1),
                KeyCode::Right | KeyCode::Up => self.step_max_articles(1),
                KeyCode::Home => self.step_max_articles(-100),
                KeyCode::End => self.step_max_articles(100),
                KeyCode::Enter => self.start_run(),
                _ => {}
            },
            Focus::CacheTtl => match key.code {
                KeyCode::Left | KeyCode::Down => self.step_cache_ttl(-1),
                KeyCode::Right | KeyCode::Up => self.step_cache_ttl(1),
                KeyCode::PageDown => self.step_cache_ttl(-60),
                KeyCode::PageUp => self.step_cache_ttl(60),
                KeyCode::Enter => self.start_run(),
                _ => {}
            },
            Focus::RunButton if activate => self.start_run(),
            Focus::ClearButton if activate => self.clear_all_caches(),
            Focus::History => match key.code {
                KeyCode::Up => self.history_select_up(),
                KeyCode::Down => self.history_select_down(),
                KeyCode::Enter => self.load_history_entry(self.history_selected),
                _ => {}
            },
            Focus::DevTools if activate || key.code == KeyCode::Char('c') => self.clear_ui_cache(),
            _ => {}
        }
    }

    fn step_max_articles(&mut self, steps: i32) {
        self.controls.step_max_articles(steps);
        self.save_prefs();
    }

    fn step_cache_ttl(&mut self, minutes: i32) {
        self.controls.step_cache_ttl(minutes);
        self.save_prefs();
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if self.is_running() {
            // spinner frame
            self.dirty = true;
        }
        let mut events = Vec::new();
        let mut finished = false;
        if let Some(rx) = &self.run_rx {
            for _ in 0..64 {
                match rx.try_recv() {
                    Ok(ev) => events.push(ev),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        finished = true;
                        break;
                    }
                }
            }
        }
        for ev in events {
            self.apply_event(ev);
        }
        if finished {
            self.finish_run();
        }
    }

    fn finish_run(&mut self) {
        self.run_rx = None;
        self.run_cancel = None;
        self.phase = RunPhase::Idle;
        self.dirty = true;
    }

    pub fn apply_event(&mut self, ev: RunEvent) {
        self.dirty = true;
        match ev {
            RunEvent::Phase(p) => self.phase = p,
            RunEvent::FetchFailed(e) => self.push_notice(NoticeLevel::Error, strings::fetch_failed(&e)),
            RunEvent::Articles(articles) => {
                if articles.is_empty() {
                    self.push_notice(NoticeLevel::Info, strings::NO_ARTICLES);
                } else {
                    let query = self
                        .run_query
                        .as_ref()
                        .map(|q| q.query.clone())
                        .unwrap_or_default();
                    self.sections.push(Section::Articles { query, articles });
                }
            }
            RunEvent::Tokens(n) => {
                self.push_notice(NoticeLevel::Info, strings::token_estimate(n));
                if eqr_core::tokens::is_high_token_estimate(n) {
                    self.push_notice(NoticeLevel::Warning, strings::HIGH_TOKENS_WARNING);
                }
            }
            RunEvent::SummaryFailed(e) => {
                self.push_notice(NoticeLevel::Error, strings::summary_failed(&e))
            }
            RunEvent::Summary(s) => {
                if s.trim().is_empty() {
                    return;
                }
                let query = self
                    .run_query
                    .as_ref()
                    .map(|q| q.query.clone())
                    .unwrap_or_default();
                self.history.record(query, s.clone());
                self.history_selected = 0;
                self.sections.push(Section::Summary(s));
            }
            RunEvent::Finished => self.finish_run(),
        }
    }

    /// Polls the worker until the run ends. Test helper.
    #[cfg(test)]
    pub fn wait_for_run(&mut self, timeout: std::time::Duration) {
        let start = std::time::Instant::now();
        while self.is_running() && start.elapsed() < timeout {
            self.on_tick();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::run::tests::{article, FakeBackend};
    use super::*;
    use crossterm::event::KeyEvent;
    use std::time::Duration;

    fn app_with(backend: FakeBackend) -> (App, Arc<FakeBackend>) {
        let b = Arc::new(backend);
        let app = App::with_backend(Some(b.clone() as Arc<dyn Backend>), AppOptions::default());
        (app, b)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for ch in s.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn notices(app: &App) -> Vec<(NoticeLevel, String)> {
        app.sections
            .iter()
            .filter_map(|s| match s {
                Section::Notice(n) => Some((n.level, n.text.clone())),
                _ => None,
            })
            .collect()
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn empty_query_warns_and_does_not_run() {
        let (mut app, b) = app_with(FakeBackend::new(vec![article("a")], "s"));
        press(&mut app, KeyCode::Enter);
        assert!(!app.is_running());
        assert_eq!(
            notices(&app),
            vec![(
                NoticeLevel::Warning,
                "Please enter a non-empty query in the sidebar.".to_string()
            )]
        );
        assert_eq!(b.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn successful_run_renders_sections_and_records_history() {
        let (mut app, _b) = app_with(FakeBackend::new(vec![article("a"), article("b")], "Bullish."));
        type_str(&mut app, "NVDA");
        press(&mut app, KeyCode::Enter);
        assert!(app.is_running());
        app.wait_for_run(WAIT);
        assert!(!app.is_running());
        assert_eq!(app.phase, RunPhase::Idle);
        assert!(matches!(&app.sections[0], Section::Articles { query, articles } if query == "NVDA" && articles.len() == 2));
        assert_eq!(
            notices(&app)[0],
            (NoticeLevel::Info, "Estimated tokens for LLM input (approx): 5".to_string())
        );
        assert_eq!(app.current_summary(), Some("Bullish."));
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history.recent()[0].query, "NVDA");
    }

    #[test]
    fn no_articles_shows_info_and_skips_history() {
        let (mut app, b) = app_with(FakeBackend::new(vec![], "s"));
        app.controls.query.set("obscure");
        app.start_run();
        app.wait_for_run(WAIT);
        assert_eq!(
            notices(&app),
            vec![(NoticeLevel::Info, strings::NO_ARTICLES.to_string())]
        );
        assert!(app.history.is_empty());
        assert_eq!(b.summaries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fetch_error_then_no_articles() {
        let mut fake = FakeBackend::new(vec![], "s");
        fake.articles = Err("dns".into());
        let (mut app, _b) = app_with(fake);
        app.controls.query.set("AAPL");
        app.start_run();
        app.wait_for_run(WAIT);
        let n = notices(&app);
        assert_eq!(n[0], (NoticeLevel::Error, "Failed to fetch articles: news: network: dns".to_string()));
        assert_eq!(n[1].1, strings::NO_ARTICLES);
    }

    #[test]
    fn summary_error_keeps_articles_and_skips_history() {
        let mut fake = FakeBackend::new(vec![article("a")], "s");
        fake.summary = Err("quota".into());
        let (mut app, _b) = app_with(fake);
        app.controls.query.set("AAPL");
        app.start_run();
        app.wait_for_run(WAIT);
        assert!(notices(&app)
            .iter()
            .any(|(l, t)| *l == NoticeLevel::Error && t == "Error during summarization: llm: rate limit: quota"));
        assert!(app.current_summary().is_none());
        assert!(app.history.is_empty());
    }

    #[test]
    fn high_token_estimate_adds_warning() {
        let mut a = article("big");
        a.description = Some("x".repeat(40_000));
        let (mut app, _b) = app_with(FakeBackend::new(vec![a], "s"));
        app.controls.query.set("AAPL");
        app.start_run();
        app.wait_for_run(WAIT);
        assert!(notices(&app)
            .iter()
            .any(|(l, t)| *l == NoticeLevel::Warning && t == strings::HIGH_TOKENS_WARNING));
    }

    #[test]
    fn history_is_newest_first_across_runs() {
        let (mut app, _b) = app_with(FakeBackend::new(vec![article("a")], "s"));
        for q in ["AAPL", "MSFT", "GOOG"] {
            app.controls.query.set(q);
            app.start_run();
            app.wait_for_run(WAIT);
        }
        let qs: Vec<_> = app.history.recent().iter().map(|e| e.query.as_str()).collect();
        assert_eq!(qs, vec!["GOOG", "MSFT", "AAPL"]);
    }

    #[test]
    fn missing_backend_reports_configuration_error() {
        let mut app = App::with_backend(None, AppOptions::default());
        app.backend_error = Some("NEWSAPI_KEY not set".into());
        app.controls.query.set("AAPL");
        app.start_run();
        assert!(!app.is_running());
        assert_eq!(
            notices(&app),
            vec![(NoticeLevel::Error, "Configuration error: NEWSAPI_KEY not set".to_string())]
        );
    }

    #[test]
    fn clear_buttons_clear_the_right_caches() {
        let (mut app, b) = app_with(FakeBackend::new(vec![article("a")], "s"));
        app.controls.query.set("AAPL");
        app.start_run();
        app.wait_for_run(WAIT);
        assert_eq!(app.ui_cache.len(), 1);

        app.show_dev_tools = true;
        app.focus = Focus::DevTools;
        press(&mut app, KeyCode::Char('c'));
        assert!(app.ui_cache.is_empty());
        assert_eq!(b.module_clears.load(Ordering::SeqCst), 0);

        app.focus = Focus::ClearButton;
        press(&mut app, KeyCode::Enter);
        assert_eq!(b.module_clears.load(Ordering::SeqCst), 1);
        assert!(notices(&app).iter().any(|(_, t)| t == strings::CLEARED_ALL));
    }

    #[test]
    fn cached_summary_skips_backend_on_rerun() {
        let (mut app, b) = app_with(FakeBackend::new(vec![article("a")], "s"));
        app.controls.query.set("AAPL");
        app.start_run();
        app.wait_for_run(WAIT);
        app.start_run();
        app.wait_for_run(WAIT);
        assert_eq!(b.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(b.summaries.load(Ordering::SeqCst), 1);
        assert_eq!(app.history.len(), 2);
    }

    #[test]
    fn tab_cycles_through_visible_controls() {
        let (mut app, _b) = app_with(FakeBackend::new(vec![], "s"));
        let mut seen = vec![app.focus];
        for _ in 0..7 {
            press(&mut app, KeyCode::Tab);
            seen.push(app.focus);
        }
        assert_eq!(seen.first(), seen.last());
        assert!(!seen.contains(&Focus::History));
        assert!(!seen.contains(&Focus::DevTools));
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::ClearButton);
    }

    #[test]
    fn slider_and_ttl_keys() {
        let (mut app, _b) = app_with(FakeBackend::new(vec![], "s"));
        app.focus = Focus::MaxArticles;
        press(&mut app, KeyCode::Right);
        assert_eq!(app.controls.max_articles, 25);
        app.focus = Focus::CacheTtl;
        press(&mut app, KeyCode::PageUp);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.controls.cache_ttl_minutes, 119);
    }

    #[test]
    fn cache_ttl_control_applies_to_ui_cache_on_run() {
        let (mut app, _b) = app_with(FakeBackend::new(vec![article("a")], "s"));
        assert_eq!(app.ui_cache.ttl(), Duration::from_secs(60 * 60));
        app.focus = Focus::CacheTtl;
        for _ in 0..5 {
            press(&mut app, KeyCode::Left);
        }
        assert_eq!(app.controls.cache_ttl_minutes, 55);
        // not applied until the next run
        assert_eq!(app.ui_cache.ttl(), Duration::from_secs(60 * 60));

        app.controls.query.set("AAPL");
        app.start_run();
        let ttl = Duration::from_secs(55 * 60);
        assert_eq!(app.ui_cache.ttl(), ttl);
        app.wait_for_run(WAIT);

        let key = NewsQuery::new("MSFT", 20);
        let t0 = std::time::Instant::now();
        app.ui_cache.insert_at(key.clone(), "old".into(), t0);
        assert_eq!(
            app.ui_cache.get_at(&key, t0 + ttl - Duration::from_secs(1)).as_deref(),
            Some("old")
        );
        assert_eq!(app.ui_cache.get_at(&key, t0 + ttl), None);
    }

    #[test]
    fn save_summary_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _b) = app_with(FakeBackend::new(vec![article("a")], "Key points"));
        app.download_dir = dir.path().to_path_buf();
        app.controls.query.set("AAPL");
        app.start_run();
        app.wait_for_run(WAIT);
        app.on_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        let written = std::fs::read_to_string(dir.path().join(strings::SUMMARY_FILE_NAME)).unwrap();
        assert_eq!(written, "Key points");
    }

    #[test]
    fn save_without_summary_warns() {
        let (mut app, _b) = app_with(FakeBackend::new(vec![], "s"));
        app.save_summary();
        assert_eq!(notices(&app)[0].0, NoticeLevel::Warning);
    }

    #[test]
    fn cancel_discards_late_results() {
        let (mut app, _b) = app_with(FakeBackend::new(vec![article("a")], "s"));
        app.controls.query.set("AAPL");
        app.start_run();
        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.is_running());
        assert!(!app.should_quit);
        std::thread::sleep(Duration::from_millis(50));
        app.on_tick();
        assert!(app.current_summary().is_none());
        assert!(app.history.is_empty());
    }

    #[test]
    fn options_prefill_controls() {
        let app = App::with_backend(
            None,
            AppOptions {
                query: Some("oil majors".into()),
                max_articles: Some(42),
                debug: true,
            },
        );
        assert_eq!(app.controls.query.text(), "oil majors");
        assert_eq!(app.controls.max_articles, 40);
        assert!(app.debug);
    }
}
