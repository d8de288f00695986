//! JSON snapshots of a run.

use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `articles` to `path` as a pretty-printed JSON array.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn save_articles<T: Serialize>(articles: &[T], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(articles)?;

    if let Err(e) = fs::write(path, json).await {
        error!(error = %e, "Failed to write JSON");
        return Err(e.into());
    }
    info!("Wrote JSON");
    Ok(())
}
