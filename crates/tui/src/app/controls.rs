use chrono::NaiveDate;
use eqr_core::news::NewsQuery;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use super::input::TextField;

pub const MAX_ARTICLES_MIN: u32 = 5;
pub const MAX_ARTICLES_MAX: u32 = 100;
pub const MAX_ARTICLES_STEP: u32 = 5;
pub const MAX_ARTICLES_DEFAULT: u32 = 20;

pub const CACHE_TTL_MIN: u32 = 1;
pub const CACHE_TTL_MAX: u32 = 1440;
pub const CACHE_TTL_DEFAULT: u32 = 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ControlError {
    #[error("Please enter a non-empty query in the sidebar.")]
    EmptyQuery,
    #[error("'{field}' must be a date like 2024-01-31 (got '{value}').")]
    BadDate { field: &'static str, value: String },
    #[error("'From' date is after 'To' date.")]
    DateOrder,
}

/// Sidebar inputs.
#[derive(Clone, Debug, Serialize)]
pub struct Controls {
    pub query: TextField,
    pub max_articles: u32,
    pub date_from: TextField,
    pub date_to: TextField,
    pub cache_ttl_minutes: u32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            query: TextField::default(),
            max_articles: MAX_ARTICLES_DEFAULT,
            date_from: TextField::default(),
            date_to: TextField::default(),
            cache_ttl_minutes: CACHE_TTL_DEFAULT,
        }
    }
}

/// Snaps to the slider grid: multiples of the step inside the range.
pub fn clamp_max_articles(n: u32) -> u32 {
    let n = n.clamp(MAX_ARTICLES_MIN, MAX_ARTICLES_MAX);
    let snapped = (n + MAX_ARTICLES_STEP / 2) / MAX_ARTICLES_STEP * MAX_ARTICLES_STEP;
    snapped.clamp(MAX_ARTICLES_MIN, MAX_ARTICLES_MAX)
}

pub fn clamp_cache_ttl(n: u32) -> u32 {
    n.clamp(CACHE_TTL_MIN, CACHE_TTL_MAX)
}

fn parse_date(field: &'static str, f: &TextField) -> Result<Option<NaiveDate>, ControlError> {
    let raw = f.text().trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ControlError::BadDate {
            field,
            value: raw.to_string(),
        })
}

impl Controls {
    pub fn step_max_articles(&mut self, steps: i32) {
        let next = self.max_articles as i64 + steps as i64 * MAX_ARTICLES_STEP as i64;
        self.max_articles = clamp_max_articles(next.max(0) as u32);
    }

    pub fn step_cache_ttl(&mut self, minutes: i32) {
        let next = self.cache_ttl_minutes as i64 + minutes as i64;
        self.cache_ttl_minutes = clamp_cache_ttl(next.max(0) as u32);
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes as u64 * 60)
    }

    /// Validates the sidebar and produces the request for one run.
    pub fn build_query(&self) -> Result<NewsQuery, ControlError> {
        if self.query.is_blank() {
            return Err(ControlError::EmptyQuery);
        }
        let from = parse_date("From", &self.date_from)?;
        let to = parse_date("To", &self.date_to)?;
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(ControlError::DateOrder);
            }
        }
        Ok(NewsQuery::new(self.query.text(), self.max_articles).with_dates(from, to))
    }
}
