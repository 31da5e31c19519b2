use crate::news::Article;

/// Estimates above this are flagged as expensive.
pub const HIGH_TOKEN_THRESHOLD: usize = 8000;

const CHARS_PER_TOKEN: usize = 4;

/// Rough token count for an English prompt: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    chars.div_ceil(CHARS_PER_TOKEN)
}

pub fn is_high_token_estimate(tokens: usize) -> bool {
    tokens > HIGH_TOKEN_THRESHOLD
}

/// Title and description of every article, the text the LLM input is sized from.
pub fn article_digest(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|a| {
            format!(
                "{} — {}",
                a.title.as_deref().unwrap_or(""),
                a.description.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
