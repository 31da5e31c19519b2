// Centralized UI strings and labels.

use unicode_width::UnicodeWidthStr;

pub const APP_TITLE: &str = "Equity Research — News Summaries";
pub const APP_INTRO: &str =
    "Enter a query on the left, then press Run to fetch articles and generate a concise LLM summary.";

// Block titles (keep surrounding spaces for visual padding)
pub const TITLE_CONTROLS: &str = " Controls ";
pub const TITLE_QUERY: &str = " Query (company, sector, event) ";
pub const TITLE_MAX_ARTICLES: &str = " Max articles ";
pub const TITLE_DATE_FROM: &str = " From (optional) ";
pub const TITLE_DATE_TO: &str = " To (optional) ";
pub const TITLE_CACHE_TTL: &str = " Cache TTL (minutes) ";
pub const TITLE_RECENT: &str = " Recent queries ";
pub const TITLE_RESULTS: &str = " Results ";
pub const TITLE_DEV_TOOLS: &str = " Developer tools & debug ";
pub const TITLE_HELP: &str = " Help / Shortcuts ";

pub const DATE_HINT: &str = "YYYY-MM-DD";
pub const TIP_MAX_ARTICLES: &str = "Tip: keep `max articles` small while developing to save tokens.";
pub const BUTTON_RUN: &str = "Run — Fetch & Summarize";
pub const BUTTON_CLEAR: &str = "Clear module & UI caches";
pub const CAPTION_APIS: &str =
    "This app uses NewsAPI (developer key limits apply) and OpenAI for summarization — watch token usage.";

// Run flow
pub const SPINNER_FETCHING: &str = "Fetching articles from NewsAPI...";
pub const SPINNER_SUMMARIZING: &str = "Generating summary with LLM (cached)...";
pub const NO_ARTICLES: &str =
    "No articles found for this query — try changing the query or increasing 'Max articles'.";
pub const HEADING_ARTICLES: &str = "Fetched articles";
pub const HEADING_SUMMARY: &str = "Summary";
pub const HIGH_TOKENS_WARNING: &str =
    "High token estimate — reduce `max articles` to control cost.";
pub const DOWNLOAD_HINT: &str = "Ctrl+S: download summary (txt)";
pub const SUMMARY_FILE_NAME: &str = "summary.txt";
pub const RUN_CANCELED: &str = "Run canceled.";
pub const RUN_IN_PROGRESS: &str = "A run is already in progress.";
pub const NOTHING_TO_DOWNLOAD: &str = "There is no summary to download yet.";

// Cache actions
pub const CLEARED_ALL: &str = "Cleared caches.";
pub const CLEARED_UI: &str = "Cleared UI cache.";

pub const DEV_TOOLS_INTRO: &str =
    "Inspect or clear caches used by the interface and the module-level cache.";
pub const DEV_TOOLS_CLEAR_HINT: &str = "Enter / c: clear UI cache only";
pub const DEV_TOOLS_MODULE_NOTE: &str =
    "Module-level cached function available: get_summary_cached_module(query, max_articles)";

pub const FOOTER_NOTES: &str = "Notes: This tool uses NewsAPI (subject to developer key limits) and an LLM for summarization. \
Keep `max articles` low during iteration to reduce API calls and token costs.";

pub const NO_HISTORY: &str = "No queries yet.";

pub const SEPARATOR: &str = "───";

pub fn found_articles(n: usize, query: &str) -> String {
    format!("Found {} articles for {}", n, query)
}

pub fn token_estimate(n: usize) -> String {
    format!("Estimated tokens for LLM input (approx): {}", n)
}

pub fn fetch_failed(e: &str) -> String {
    format!("Failed to fetch articles: {}", e)
}

pub fn summary_failed(e: &str) -> String {
    format!("Error during summarization: {}", e)
}

pub fn config_error(e: &str) -> String {
    format!("Configuration error: {}", e)
}

pub fn history_item(query: &str) -> String {
    format!("Load: {}", query)
}

pub fn cache_sizes(ui: usize, module: usize) -> String {
    format!("UI cache entries: {}    Module cache entries: {}", ui, module)
}

pub fn slider_bar(value: u32, min: u32, max: u32, width: usize) -> String {
    let width = width.max(2);
    let span = (max - min).max(1) as usize;
    let filled = ((value.saturating_sub(min)) as usize * width).div_ceil(span).min(width);
    format!("{}{}", "=".repeat(filled), "·".repeat(width - filled))
}

pub const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

pub fn spinner(tick: u64) -> &'static str {
    SPINNER_FRAMES[(tick as usize) % SPINNER_FRAMES.len()]
}

// Build the status bar line with width-aware compaction.
// - phase: "Idle", "Fetching", ...
// - focus: label of the focused control
// - history_len / ui_cache_len: counters
// - backend: provider label, or None when unconfigured
pub fn build_status_line(
    phase: &str,
    focus: &str,
    history_len: usize,
    ui_cache_len: usize,
    backend: Option<&str>,
    max_width: u16,
) -> String {
    let mut segments: Vec<String> = Vec::new();
    segments.push(format!("[{}][{}]", phase, focus));
    segments.push(format!("[{}]", backend.unwrap_or("not configured")));
    segments.push(format!("Hist:{}", history_len));
    segments.push(format!("Cache:{}", ui_cache_len));
    // Hints ordered by importance; appended while space allows.
    let hints: [&str; 6] = [
        "Ctrl+R: run",
        "Tab: next field",
        "Ctrl+S: save summary",
        "F12: dev tools",
        "PgUp/PgDn: scroll",
        "F1: help",
    ];
    for h in hints {
        segments.push(h.to_string());
    }

    let sep = "  |  ";
    let mut out = String::new();
    let mut used = 0usize;
    for (i, seg) in segments.iter().enumerate() {
        let segw = UnicodeWidthStr::width(seg.as_str());
        let addw = segw + if i == 0 { 0 } else { UnicodeWidthStr::width(sep) };
        if used + addw > max_width as usize {
            break;
        }
        if i > 0 {
            out.push_str(sep);
            used += UnicodeWidthStr::width(sep);
        }
        out.push_str(seg);
        used += segw;
    }
    out
}

pub fn help_lines_ascii() -> &'static [&'static str] {
    &[
        "Run",
        "  Ctrl+R or Enter in a field: Run    Esc: Quit    Ctrl+C: Cancel run / quit",
        "Navigation",
        "  Tab / Shift+Tab: Next / previous control    F12: Developer tools",
        "Controls",
        "  Text fields: type, Backspace/Delete, Home/End, Ctrl+Arrow word move",
        "  Ctrl+W: Delete prev word    Ctrl+U/K: Kill to start/end",
        "  Max articles: Left/Right by 5    Cache TTL: Left/Right by 1, PgUp/PgDn by 60",
        "  Buttons: Enter or Space",
        "Results",
        "  PgUp/PgDn or mouse wheel: Scroll    Ctrl+Home/End: Top/bottom",
        "  Ctrl+S: Download summary as summary.txt",
        "Recent queries",
        "  Up/Down: Select    Enter or click: Load into query box",
        "Help",
        "  F1: Open/close this panel",
    ]
}
