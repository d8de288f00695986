//! Turn a source-specific payload into [`NormalizedArticle`]s.

use super::path::{resolve, resolve_list, resolve_str};
use crate::config::ResponseMapping;
use crate::models::NormalizedArticle;
use serde_json::Value;
use tracing::debug;

/// Extract every usable article from `payload`.
///
/// Items without a title or a url are dropped. Output order follows the
/// source list. A payload of the wrong shape simply yields nothing.
pub fn map_response(payload: &Value, mapping: &ResponseMapping) -> Vec<NormalizedArticle> {
    let items = resolve_list(payload, Some(mapping.articles_path.as_str()));
    let articles: Vec<NormalizedArticle> = items
        .iter()
        .filter_map(|item| map_item(item, mapping))
        .collect();

    let dropped = items.len() - articles.len();
    if dropped > 0 {
        debug!(dropped, kept = articles.len(), "Dropped items without title or url");
    }
    articles
}

/// Map one list element. `None` when the title or url is missing or blank.
pub fn map_item(item: &Value, mapping: &ResponseMapping) -> Option<NormalizedArticle> {
    let title = resolve_str(item, Some(mapping.title_field.as_str()))?;
    let url = resolve_str(item, Some(mapping.url_field.as_str()))?;

    Some(NormalizedArticle {
        title: title.trim().to_string(),
        url: url.trim().to_string(),
        description: resolve_str(item, Some(mapping.description_field.as_str())).map(str::to_string),
        published_at: resolve(item, mapping.published_at_path.as_deref())
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}
