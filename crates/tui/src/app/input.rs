use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// Single-line text box. `cursor` counts graphemes, not bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TextField {
    pub buffer: String,
    pub cursor: usize,
}

impl TextField {
    pub fn with_text<S: Into<String>>(s: S) -> Self {
        let buffer: String = s.into();
        let cursor = buffer.graphemes(true).count();
        Self { buffer, cursor }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn set<S: Into<String>>(&mut self, s: S) {
        *self = Self::with_text(s);
    }

    fn len(&self) -> usize {
        self.buffer.graphemes(true).count()
    }

    /// Inserts at the cursor; line breaks become spaces.
    pub fn insert_text(&mut self, s: &str) {
        let s = s.replace(['\r', '\n'], " ");
        let parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        let mut new_buffer = String::new();
        for g in &parts[..idx] {
            new_buffer.push_str(g);
        }
        new_buffer.push_str(&s);
        for g in &parts[idx..] {
            new_buffer.push_str(g);
        }
        self.buffer = new_buffer;
        let added = s.graphemes(true).count();
        self.cursor = (idx + added).min(self.len());
    }

    pub fn delete_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        parts.remove(idx - 1);
        self.buffer = parts.concat();
        self.cursor = idx - 1;
    }

    pub fn delete_right(&mut self) {
        let mut parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let idx = self.cursor.min(parts.len());
        if idx < parts.len() {
            parts.remove(idx);
            self.buffer = parts.concat();
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    fn word_start_before(parts: &[&str], from: usize) -> usize {
        let mut i = from;
        while i > 0 && parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        while i > 0 && !parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        i
    }

    pub fn move_word_left(&mut self) {
        let parts: Vec<&str> = self.buffer.graphemes(true).collect();
        self.cursor = Self::word_start_before(&parts, self.cursor.min(parts.len()));
    }

    pub fn move_word_right(&mut self) {
        let parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let mut i = self.cursor.min(parts.len());
        while i < parts.len() && parts[i].trim().is_empty() {
            i += 1;
        }
        while i < parts.len() && !parts[i].trim().is_empty() {
            i += 1;
        }
        self.cursor = i;
    }

    pub fn delete_prev_word(&mut self) {
        let parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let end = self.cursor.min(parts.len());
        let start = Self::word_start_before(&parts, end);
        let mut kept = parts.clone();
        kept.drain(start..end);
        self.buffer = kept.concat();
        self.cursor = start;
    }

    pub fn kill_to_start(&mut self) {
        let parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let end = self.cursor.min(parts.len());
        self.buffer = parts[end..].concat();
        self.cursor = 0;
    }

    pub fn kill_to_end(&mut self) {
        let parts: Vec<&str> = self.buffer.graphemes(true).collect();
        let end = self.cursor.min(parts.len());
        self.buffer = parts[..end].concat();
    }

    /// Applies an editing key. Returns false for keys a text box does not handle.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('a') if ctrl => self.move_home(),
            KeyCode::Char('e') if ctrl => self.move_end(),
            KeyCode::Char('w') if ctrl => self.delete_prev_word(),
            KeyCode::Char('u') if ctrl => self.kill_to_start(),
            KeyCode::Char('k') if ctrl => self.kill_to_end(),
            KeyCode::Char(_) if ctrl => return false,
            KeyCode::Char(ch) => {
                let mut buf = [0u8; 4];
                self.insert_text(ch.encode_utf8(&mut buf));
            }
            KeyCode::Backspace => self.delete_left(),
            KeyCode::Delete => self.delete_right(),
            KeyCode::Left if ctrl => self.move_word_left(),
            KeyCode::Right if ctrl => self.move_word_right(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }
}
