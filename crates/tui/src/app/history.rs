use tracing::info;

use super::{App, Focus};

impl App {
    pub fn history_select_up(&mut self) {
        self.history_selected = self.history_selected.saturating_sub(1);
    }

    pub fn history_select_down(&mut self) {
        let n = self.history.recent().len();
        if self.history_selected + 1 < n {
            self.history_selected += 1;
        }
    }

    /// Copies a recent query back into the query box. Does not start a run.
    pub fn load_history_entry(&mut self, idx: usize) {
        let Some(entry) = self.history.recent().get(idx) else {
            return;
        };
        info!(target: "tui", "load history entry {} q={:?}", idx, entry.query);
        self.controls.query.set(entry.query.clone());
        self.history_selected = idx;
        self.focus = Focus::Query;
    }
}

#[cfg(test)]
mod tests {
    use crate::app::{App, AppOptions, Focus};

    #[test]
    fn load_sets_query_without_running() {
        let mut app = App::with_backend(None, AppOptions::default());
        app.history.record("AAPL", "s1");
        app.history.record("MSFT", "s2");
        app.history_select_down();
        assert_eq!(app.history_selected, 1);
        app.load_history_entry(app.history_selected);
        assert_eq!(app.controls.query.text(), "AAPL");
        assert_eq!(app.focus, Focus::Query);
        assert!(!app.is_running());
        assert!(app.sections.is_empty());
    }

    #[test]
    fn selection_stays_within_displayed_entries() {
        let mut app = App::with_backend(None, AppOptions::default());
        for i in 0..12 {
            app.history.record(format!("q{i}"), "s");
        }
        for _ in 0..20 {
            app.history_select_down();
        }
        assert_eq!(app.history_selected, 9);
        app.load_history_entry(10);
        assert_eq!(app.controls.query.text(), "");
        for _ in 0..20 {
            app.history_select_up();
        }
        assert_eq!(app.history_selected, 0);
    }
}
