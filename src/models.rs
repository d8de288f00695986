//! Data models for fetched and enriched articles.
//!
//! - [`NormalizedArticle`]: the source-independent record produced by the
//!   response mapper and consumed by ranking and the output writers
//! - [`EnrichedArticle`]: a normalized article after the AI pass has assigned
//!   it a topic, an emoji and a one-sentence summary

use serde::{Deserialize, Serialize};

/// Emoji used when an article has not been (or could not be) enriched.
pub const DEFAULT_EMOJI: &str = "📰";

/// A news article extracted from a source payload.
///
/// `published_at` is kept exactly as the source sent it. Parsing happens
/// only inside ranking, so a malformed timestamp never prevents an article
/// from being relayed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NormalizedArticle {
    /// Headline text.
    pub title: String,
    /// Canonical link to the article.
    pub url: String,
    /// Optional teaser or abstract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw publication timestamp, unparsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// An article annotated by the generative-AI pass.
///
/// Every annotation is optional: the model is free to omit fields and the
/// formatter falls back to [`DEFAULT_EMOJI`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichedArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl EnrichedArticle {
    /// The emoji to print in front of the article, never empty.
    pub fn emoji_or_default(&self) -> &str {
        match self.emoji.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => e,
            _ => DEFAULT_EMOJI,
        }
    }
}

impl From<NormalizedArticle> for EnrichedArticle {
    fn from(article: NormalizedArticle) -> Self {
        Self {
            title: article.title,
            url: article.url,
            topic: None,
            emoji: None,
            summary: None,
        }
    }
}
