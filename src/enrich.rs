//! Generative-AI enrichment of ranked articles.
//!
//! The module is split along the same seam as any LLM client:
//! - [`AskAsync`]: send a prompt, get text back
//! - [`GeminiClient`]: the Gemini `generateContent` implementation
//! - [`enrich_articles`] / [`select_relevant`]: prompt building and reply
//!   parsing on top of any [`AskAsync`]
//!
//! Enrichment is best effort. Every failure is logged and the caller gets
//! the unenriched articles back, so a broken AI pass never blocks relaying.

use crate::models::{EnrichedArticle, NormalizedArticle};
use crate::utils::{looks_truncated, truncate_for_log};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Public Gemini API host.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json|```").unwrap());

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("AI request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI endpoint returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("AI reply contained no text")]
    EmptyReply,
    #[error("AI reply is not the expected JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Send a prompt to a language model and receive its reply.
pub trait AskAsync {
    type Response;

    async fn ask(&self, prompt: &str) -> Result<Self::Response, EnrichError>;
}

/// Client for Gemini's `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Point the client at another host (proxies, tests).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
    }
}

impl AskAsync for GeminiClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str) -> Result<Self::Response, EnrichError> {
        let t0 = Instant::now();
        let body = json!({"contents": [{"parts": [{"text": prompt}]}]});

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        debug!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Gemini responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichError::Status {
                status,
                body: truncate_for_log(&body, 300),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.first_text().ok_or(EnrichError::EmptyReply)?;
        debug!(reply = %truncate_for_log(&text, 300), "Raw text from Gemini");
        Ok(text)
    }
}

/// Prompt asking for a topic, emoji and summary per article.
pub fn enrich_prompt(articles: &[NormalizedArticle]) -> String {
    let mut prompt = String::from(
        "For each news article below, do the following:\n\
         - Assign a topic from [Space, AI, Politics, Health, Science, Tech, Other].\n\
         - Suggest an appropriate emoji for that topic.\n\
         - Write a concise 1-sentence summary.\n\
         Reply only with a JSON list, where each item is:\n\
         {\"title\": \"...\", \"url\": \"...\", \"topic\": \"...\", \"emoji\": \"...\", \"summary\": \"...\"}\n",
    );
    push_listing(&mut prompt, articles);
    prompt
}

/// Prompt asking the model to pick the `n` most relevant articles.
pub fn select_prompt(articles: &[NormalizedArticle], n: usize) -> String {
    let mut prompt = format!(
        "Analyze the provided list of titles and URLs and select the top {n} most relevant \
         for engineering students and recent graduates, focusing on their career development, \
         educational growth, and future opportunities. \
         Only reply with your selection as a JSON array, with no explanation or additional text. \
         Format: [{{\"title\": \"Short and Attractive Title\", \"url\": \"Original URL\"}}]\n"
    );
    push_listing(&mut prompt, articles);
    prompt
}

fn push_listing(prompt: &mut String, articles: &[NormalizedArticle]) {
    let listing = articles
        .iter()
        .map(|a| format!("Title: {}\nURL: {}", a.title, a.url))
        .collect::<Vec<_>>()
        .join("\n");
    prompt.push_str(&listing);
}

/// Parse a JSON list out of a model reply, tolerating Markdown code fences.
pub fn parse_reply_list<T: DeserializeOwned>(reply: &str) -> Result<Vec<T>, EnrichError> {
    let cleaned = CODE_FENCE.replace_all(reply, "");
    serde_json::from_str(cleaned.trim()).map_err(|e| {
        if looks_truncated(&e) {
            warn!(error = %e, "AI reply looks truncated");
        }
        EnrichError::Parse(e)
    })
}

/// Annotate articles with topic, emoji and summary.
///
/// Falls back to the plain articles when the model fails or replies with
/// nothing usable.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn enrich_articles<A>(ai: &A, articles: &[NormalizedArticle]) -> Vec<EnrichedArticle>
where
    A: AskAsync<Response = String>,
{
    let fallback = || articles.iter().cloned().map(EnrichedArticle::from).collect::<Vec<_>>();
    if articles.is_empty() {
        return Vec::new();
    }

    let reply = match ai.ask(&enrich_prompt(articles)).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "Failed to enrich articles; relaying them unenriched");
            return fallback();
        }
    };

    match parse_reply_list::<EnrichedArticle>(&reply) {
        Ok(enriched) => {
            let usable: Vec<EnrichedArticle> = enriched
                .into_iter()
                .filter(|a| !a.title.trim().is_empty() && !a.url.trim().is_empty())
                .collect();
            if usable.is_empty() {
                warn!("AI reply contained no usable articles; relaying them unenriched");
                return fallback();
            }
            info!(count = usable.len(), "Enrichment complete");
            usable
        }
        Err(e) => {
            error!(error = %e, reply = %truncate_for_log(&reply, 300), "Failed to parse enrichment reply");
            fallback()
        }
    }
}

#[derive(Debug, Deserialize)]
struct Selection {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

/// Let the model choose the `n` most relevant articles.
///
/// Picks are matched back to the input by url, so description and timestamp
/// survive; the model's (possibly shortened) title replaces the original.
/// Unknown urls are ignored. On any failure the first `n` inputs are kept.
#[instrument(level = "info", skip_all, fields(count = articles.len(), n = n))]
pub async fn select_relevant<A>(
    ai: &A,
    articles: Vec<NormalizedArticle>,
    n: usize,
) -> Vec<NormalizedArticle>
where
    A: AskAsync<Response = String>,
{
    if articles.len() <= n || n == 0 {
        return articles.into_iter().take(n).collect();
    }

    let picks = match ai.ask(&select_prompt(&articles, n)).await {
        Ok(reply) => parse_reply_list::<Selection>(&reply),
        Err(e) => Err(e),
    };
    let picks = match picks {
        Ok(picks) => picks,
        Err(e) => {
            error!(error = %e, "Relevance selection failed; keeping ranking order");
            return articles.into_iter().take(n).collect();
        }
    };

    let mut by_url: HashMap<String, NormalizedArticle> =
        articles.iter().cloned().map(|a| (a.url.clone(), a)).collect();
    let selected: Vec<NormalizedArticle> = picks
        .into_iter()
        .filter_map(|pick| {
            let mut article = by_url.remove(pick.url.trim())?;
            if !pick.title.trim().is_empty() {
                article.title = pick.title.trim().to_string();
            }
            Some(article)
        })
        .take(n)
        .collect();

    if selected.is_empty() {
        warn!("AI selected no known articles; keeping ranking order");
        return articles.into_iter().take(n).collect();
    }
    info!(selected = selected.len(), "Relevance selection complete");
    selected
}
