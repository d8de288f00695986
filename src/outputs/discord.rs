//! Discord-ready formatting and webhook delivery.
//!
//! Articles become one Markdown link per line, prefixed by their emoji:
//!
//! ```text
//! 🚀 [Starship reaches orbit](https://example.com/starship)
//! 📰 [Unenriched headline](https://example.com/plain)
//! ```
//!
//! The whole list is sent as a single webhook message. Discord rejects
//! content over 2000 characters, so anything above [`MAX_CONTENT_CHARS`] is
//! cut and marked as truncated.

use crate::models::EnrichedArticle;
use crate::utils::{take_chars, truncate_for_log};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Longest message content sent unmodified.
pub const MAX_CONTENT_CHARS: usize = 1900;
/// Characters kept from content that is too long.
const TRUNCATED_KEEP_CHARS: usize = MAX_CONTENT_CHARS - 20;
const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Display name used for webhook posts unless overridden.
pub const DEFAULT_USERNAME: &str = "Headline Relay";

#[derive(Debug, Error)]
pub enum PostError {
    #[error("invalid or missing webhook URL")]
    InvalidWebhook,
    #[error("Discord webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Discord webhook HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Render articles as `"{emoji} [{title}]({url})"` lines.
///
/// Entries without a title or url are skipped.
pub fn format_one_liner(articles: &[EnrichedArticle]) -> String {
    let mut lines = Vec::with_capacity(articles.len());
    for (idx, article) in articles.iter().enumerate() {
        let title = article.title.trim();
        let url = article.url.trim();
        if title.is_empty() || url.is_empty() {
            warn!(idx, title, url, "Skipping article with missing title or url");
            continue;
        }
        lines.push(format!("{} [{}]({})", article.emoji_or_default(), title, url));
    }
    lines.join("\n")
}

/// Fit `content` into a single Discord message.
pub fn truncate_content(content: &str) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content.to_string();
    }
    format!("{}{}", take_chars(content, TRUNCATED_KEEP_CHARS), TRUNCATION_MARKER)
}

/// Write the formatted lines to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_one_liners(content: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    fs::write(path, content).await?;
    info!(lines = content.lines().count(), "Discord-ready news written");
    Ok(())
}

/// Body of a webhook execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscordPayload {
    pub username: String,
    pub content: String,
}

impl DiscordPayload {
    /// Build a payload, truncating `content` to fit one message.
    pub fn new(username: &str, content: &str) -> Self {
        Self {
            username: username.to_string(),
            content: truncate_content(content),
        }
    }

    /// Size of the serialized body in bytes.
    pub fn byte_size(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or_default()
    }
}

/// Log what would be posted instead of posting it.
pub fn dry_run(payload: &DiscordPayload, preview_len: usize) {
    info!(
        username = %payload.username,
        bytes = payload.byte_size(),
        preview = %take_chars(&payload.content, preview_len),
        "DRY RUN: would post to Discord"
    );
}

/// Sends messages to one Discord webhook.
#[derive(Clone)]
pub struct DiscordPoster {
    webhook: String,
    client: Client,
    timeout: Duration,
}

// The webhook URL embeds its token.
impl fmt::Debug for DiscordPoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordPoster")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DiscordPoster {
    /// Accepts only `http://` and `https://` webhook URLs.
    pub fn new(webhook: &str) -> Result<Self, PostError> {
        let webhook = webhook.trim();
        if !(webhook.starts_with("http://") || webhook.starts_with("https://")) {
            return Err(PostError::InvalidWebhook);
        }
        Ok(Self {
            webhook: webhook.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(15),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[instrument(level = "info", skip_all, fields(bytes = payload.byte_size()))]
    pub async fn post(&self, payload: &DiscordPayload) -> Result<(), PostError> {
        let response = self
            .client
            .post(&self.webhook)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostError::Status {
                status,
                body: truncate_for_log(&body, 200),
            });
        }
        info!(%status, "Posted to Discord");
        Ok(())
    }
}
