//! Recency ranking with a stable fallback for undated articles.
//!
//! Ordering rules:
//! - newest parsed timestamp first
//! - articles whose timestamp is missing or unparseable come after every
//!   dated article, in their original relative order
//! - if nothing parses at all, the input order is returned untouched

use super::timestamp::{RawTimestamp, normalize};
use crate::config::ResponseMapping;
use crate::models::NormalizedArticle;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Number of articles kept when a source does not configure a limit.
pub const DEFAULT_LIMIT: usize = 10;

/// Anything the ranker can pull a publication timestamp out of.
pub trait Dated {
    fn raw_timestamp<'a>(&'a self, mapping: &ResponseMapping) -> RawTimestamp<'a>;
}

impl Dated for NormalizedArticle {
    // The mapping was already applied when the article was extracted.
    fn raw_timestamp<'a>(&'a self, _mapping: &ResponseMapping) -> RawTimestamp<'a> {
        RawTimestamp::from(self.published_at.as_deref())
    }
}

/// An article annotated for the duration of a sort.
struct RankedArticle<T> {
    index: usize,
    parsed: Option<DateTime<Utc>>,
    article: T,
}

/// Order `articles` newest first and keep at most `limit` of them.
pub fn rank_and_limit<T: Dated>(articles: Vec<T>, mapping: &ResponseMapping, limit: usize) -> Vec<T> {
    if limit == 0 || articles.is_empty() {
        return Vec::new();
    }

    let mut unparsed = 0usize;
    let mut ranked: Vec<RankedArticle<T>> = articles
        .into_iter()
        .enumerate()
        .map(|(index, article)| {
            let parsed = normalize(article.raw_timestamp(mapping)).ok();
            if parsed.is_none() {
                unparsed += 1;
            }
            RankedArticle {
                index,
                parsed,
                article,
            }
        })
        .collect();

    if unparsed == ranked.len() {
        debug!(count = ranked.len(), "No timestamps parsed for any article; preserving source order");
    } else {
        if unparsed > 0 {
            debug!(unparsed, total = ranked.len(), "Undated articles ranked as oldest");
        }
        // `None < Some(_)`, so comparing b to a puts undated articles last.
        ranked.sort_by(|a, b| b.parsed.cmp(&a.parsed).then(a.index.cmp(&b.index)));
    }

    ranked.into_iter().take(limit).map(|r| r.article).collect()
}
