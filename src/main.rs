//! # Headline Relay
//!
//! Fetches top headlines from configurable REST news APIs, keeps the newest
//! articles of every source, optionally lets Gemini tag and summarize them,
//! and relays the result to a Discord channel.
//!
//! ## Usage
//!
//! ```sh
//! headline_relay --config configs/api_config.json --output-dir ./out --dry-run
//! ```
//!
//! ## Architecture
//!
//! 1. **Config**: load sources and resolve their API keys (fatal on error)
//! 2. **Fetching**: one concurrent request per (country, category) dimension
//! 3. **Ranking**: newest first, top N per source
//! 4. **Enrichment**: optional AI pass, falls back to plain articles
//! 5. **Output**: JSON snapshots, `output.txt` and a Discord webhook post

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod articles;
mod cli;
mod config;
mod enrich;
mod models;
mod outputs;
mod sources;
mod utils;

use articles::rank_and_limit;
use cli::Cli;
use config::{AppConfig, SourceConfig};
use enrich::{GeminiClient, enrich_articles, select_relevant};
use models::{EnrichedArticle, NormalizedArticle};
use outputs::discord::{self, DiscordPayload, DiscordPoster};
use outputs::{DISCORD_OUTPUT_FILE, FILTERED_NEWS_FILE, LATEST_NEWS_FILE, json};
use sources::fetcher::SourceFetcher;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("headline_relay starting up");

    let args = Cli::parse();
    debug!(config = %args.config.display(), output_dir = %args.output_dir.display(), sources = ?args.sources, "Parsed CLI arguments");

    // ---- Configuration ----
    let config = match AppConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "Failed to load source configuration");
            return Err(e.into());
        }
    };
    info!(sources = config.sources.len(), "Loaded configuration");

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Fetch & rank ----
    let timeout = Duration::from_secs(args.timeout_secs);
    let fetcher = SourceFetcher::new(timeout)?;
    let selected = select_sources(&config, &args.sources);
    let ranked = collect_ranked(&fetcher, &selected, args.limit).await;
    info!(count = ranked.len(), sources = selected.len(), "Ranked articles ready");

    let latest_path = args.output_dir.join(LATEST_NEWS_FILE);
    json::save_articles(&ranked, &latest_path).await?;

    // ---- Enrichment ----
    let enriched = enrich_step(&args, ranked, timeout).await;
    if let Err(e) = json::save_articles(&enriched, &args.output_dir.join(FILTERED_NEWS_FILE)).await {
        error!(error = %e, "Failed to write enriched articles");
    }

    // ---- Discord ----
    let content = discord::format_one_liner(&enriched);
    let output_path = args.output_dir.join(DISCORD_OUTPUT_FILE);
    if let Err(e) = discord::write_one_liners(&content, &output_path).await {
        error!(path = %output_path.display(), error = %e, "Failed writing Discord output");
    }
    relay(&args, &content, timeout).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Sources to fetch, in configuration order.
///
/// An empty `names` selects every source. Unknown names are logged and
/// ignored.
fn select_sources<'a>(config: &'a AppConfig, names: &[String]) -> Vec<&'a SourceConfig> {
    if names.is_empty() {
        return config.sources.iter().collect();
    }
    for name in names {
        if config.get_source(name).is_none() {
            warn!(source = %name, "Unknown source requested; skipping");
        }
    }
    config
        .sources
        .iter()
        .filter(|s| names.iter().any(|n| n == &s.name))
        .collect()
}

/// Fetch each source, rank it on its own, and concatenate the results.
async fn collect_ranked(
    fetcher: &SourceFetcher,
    sources: &[&SourceConfig],
    limit_override: Option<usize>,
) -> Vec<NormalizedArticle> {
    let mut all = Vec::new();
    for source in sources {
        let fetched = fetcher.fetch_source(source).await;
        let limit = limit_override.unwrap_or_else(|| source.limit());
        let ranked = rank_and_limit(fetched, &source.response_mapping, limit);
        info!(source = %source.name, limit, kept = ranked.len(), "Ranked source");
        all.extend(ranked);
    }
    all
}

/// Run the optional AI pass; any failure yields the plain articles.
async fn enrich_step(
    args: &Cli,
    ranked: Vec<NormalizedArticle>,
    timeout: Duration,
) -> Vec<EnrichedArticle> {
    let plain = |articles: Vec<NormalizedArticle>| {
        articles.into_iter().map(EnrichedArticle::from).collect::<Vec<_>>()
    };

    let key = match args.gemini_api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() && !args.skip_enrich => key.to_string(),
        _ => {
            info!(skip_enrich = args.skip_enrich, "Skipping AI enrichment");
            return plain(ranked);
        }
    };

    let client = match GeminiClient::new(key, &args.gemini_model, timeout) {
        Ok(client) => client.with_api_base(&args.gemini_api_base),
        Err(e) => {
            error!(error = %e, "Failed to build Gemini client; skipping enrichment");
            return plain(ranked);
        }
    };

    let candidates = match args.select_relevant {
        Some(n) => select_relevant(&client, ranked, n).await,
        None => ranked,
    };
    enrich_articles(&client, &candidates).await
}

/// Post (or preview) the formatted list. Never fails the run.
async fn relay(args: &Cli, content: &str, timeout: Duration) {
    if content.is_empty() {
        warn!("No articles to relay; skipping Discord post");
        return;
    }

    let payload = DiscordPayload::new(&args.discord_username, content);
    if args.dry_run {
        discord::dry_run(&payload, args.preview_length);
        return;
    }

    let Some(webhook) = args.webhook.as_deref() else {
        warn!("No Discord webhook configured; skipping post");
        return;
    };
    let poster = match DiscordPoster::new(webhook) {
        Ok(poster) => poster.with_timeout(timeout),
        Err(e) => {
            error!(error = %e, "Cannot post to Discord");
            return;
        }
    };
    if let Err(e) = poster.post(&payload).await {
        error!(error = %e, "Failed to post to Discord");
    }
}
