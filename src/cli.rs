//! Command-line interface definitions for Headline Relay.
//!
//! Secrets (the Gemini key and the Discord webhook) can be provided through
//! environment variables instead of flags.

use crate::enrich::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::outputs::discord::DEFAULT_USERNAME;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for Headline Relay.
///
/// # Examples
///
/// ```sh
/// # Fetch every configured source, skip the AI pass, preview the post
/// headline_relay --skip-enrich --dry-run
///
/// # Only NewsAPI, top 5, enriched, posted
/// GEMINI_API_KEY=... DISCORD_WEBHOOK_URL=... headline_relay --source NewsAPI --limit 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the source configuration (.json, .yaml or .yml)
    #[arg(short, long, default_value = "configs/api_config.json")]
    pub config: PathBuf,

    /// Directory for latest_news.json, filtered_news.json and output.txt
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Only fetch the named source (repeatable)
    #[arg(short, long = "source")]
    pub sources: Vec<String>,

    /// Override every source's filter_limit
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    /// Do not call the AI API even when a key is available
    #[arg(long)]
    pub skip_enrich: bool,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub gemini_model: String,

    /// Gemini API host
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub gemini_api_base: String,

    /// Let the model pick the N most relevant articles before enrichment
    #[arg(long, value_name = "N")]
    pub select_relevant: Option<usize>,

    /// Discord webhook URL
    #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    pub webhook: Option<String>,

    /// Username shown on the Discord message
    #[arg(long, default_value = DEFAULT_USERNAME)]
    pub discord_username: String,

    /// Log the Discord message instead of posting it
    #[arg(long)]
    pub dry_run: bool,

    /// Characters of content shown in a dry run
    #[arg(long, default_value_t = 300)]
    pub preview_length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["headline_relay"]);

        assert_eq!(cli.config, PathBuf::from("configs/api_config.json"));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(cli.sources.is_empty());
        assert_eq!(cli.limit, None);
        assert_eq!(cli.timeout_secs, 15);
        assert!(!cli.skip_enrich);
        assert_eq!(cli.gemini_model, "gemini-2.0-flash-exp");
        assert_eq!(cli.gemini_api_base, DEFAULT_API_BASE);
        assert_eq!(cli.discord_username, DEFAULT_USERNAME);
        assert!(!cli.dry_run);
        assert_eq!(cli.preview_length, 300);
    }

    #[test]
    fn test_cli_repeatable_sources_and_short_flags() {
        let cli = Cli::parse_from([
            "headline_relay",
            "-c",
            "sources.yaml",
            "-o",
            "/tmp/out",
            "-s",
            "NewsAPI",
            "--source",
            "Guardian",
            "-l",
            "5",
        ]);

        assert_eq!(cli.config, PathBuf::from("sources.yaml"));
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cli.sources, ["NewsAPI", "Guardian"]);
        assert_eq!(cli.limit, Some(5));
    }

    #[test]
    fn test_cli_enrichment_and_posting_flags() {
        let cli = Cli::parse_from([
            "headline_relay",
            "--skip-enrich",
            "--gemini-api-key",
            "g-key",
            "--select-relevant",
            "3",
            "--webhook",
            "https://discord.com/api/webhooks/1/x",
            "--dry-run",
            "--preview-length",
            "50",
        ]);

        assert!(cli.skip_enrich);
        assert_eq!(cli.gemini_api_key.as_deref(), Some("g-key"));
        assert_eq!(cli.select_relevant, Some(3));
        assert_eq!(cli.webhook.as_deref(), Some("https://discord.com/api/webhooks/1/x"));
        assert!(cli.dry_run);
        assert_eq!(cli.preview_length, 50);
    }

    #[test]
    fn test_cli_rejects_negative_limit() {
        assert!(Cli::try_parse_from(["headline_relay", "--limit", "-1"]).is_err());
    }
}
