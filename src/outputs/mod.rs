//! Everything a run leaves behind.
//!
//! # Submodules
//!
//! - [`json`]: pretty-printed article snapshots
//! - [`discord`]: one-liner formatting, `output.txt`, webhook posting
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── latest_news.json    # ranked articles, every selected source
//! ├── filtered_news.json  # after AI enrichment (or the unenriched fallback)
//! └── output.txt          # Discord-ready one-liners
//! ```

pub mod discord;
pub mod json;

/// Ranked articles.
pub const LATEST_NEWS_FILE: &str = "latest_news.json";
/// Enriched articles.
pub const FILTERED_NEWS_FILE: &str = "filtered_news.json";
/// Discord message body.
pub const DISCORD_OUTPUT_FILE: &str = "output.txt";
