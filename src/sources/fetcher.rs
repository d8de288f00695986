//! Concurrent per-dimension fetching for one source.
//!
//! Every dimension becomes its own request future; all of them are driven
//! together and joined before merging, so no state is shared while they run.
//! A failing dimension is logged and contributes nothing.

use super::{Dimension, build_endpoint, dimensions, query_params};
use crate::articles::map_response;
use crate::config::SourceConfig;
use crate::models::NormalizedArticle;
use crate::utils::truncate_for_log;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Why a single dimension produced no articles.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid endpoint url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// HTTP side of a run. Cheap to clone; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch every dimension of `source` and merge the results.
    ///
    /// Dimensions are merged in submission order regardless of which
    /// request finishes first.
    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    pub async fn fetch_source(&self, source: &SourceConfig) -> Vec<NormalizedArticle> {
        let dims = dimensions(source);
        let results = join_all(dims.iter().map(|dim| self.fetch_dimension(source, dim))).await;

        let mut merged = Vec::new();
        let mut failed = 0usize;
        for (dim, result) in dims.iter().zip(results) {
            match result {
                Ok(articles) => {
                    debug!(dimension = %dim, count = articles.len(), "Fetched dimension");
                    merged.extend(articles);
                }
                Err(e) => {
                    failed += 1;
                    warn!(dimension = %dim, error = %e, "Dimension fetch failed; skipping");
                }
            }
        }

        info!(
            dimensions = dims.len(),
            failed,
            count = merged.len(),
            "Fetched source articles"
        );
        merged
    }

    /// Fetch and map a single dimension.
    pub async fn fetch_dimension(
        &self,
        source: &SourceConfig,
        dimension: &Dimension,
    ) -> Result<Vec<NormalizedArticle>, FetchError> {
        let endpoint = build_endpoint(source, dimension);
        let url = Url::parse(&endpoint).map_err(|source| FetchError::InvalidUrl {
            url: endpoint.clone(),
            source,
        })?;
        // The query carries the API key, so only the bare endpoint is logged.
        debug!(%endpoint, dimension = %dimension, "Requesting");

        let mut request = self
            .client
            .get(url)
            .query(&query_params(source, dimension));
        for (name, value) in &source.headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: truncate_for_log(&body, 200),
            });
        }

        let payload: serde_json::Value = serde_json::from_str(&body)?;
        Ok(map_response(&payload, &source.response_mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> SourceFetcher {
        SourceFetcher::new(Duration::from_secs(5)).unwrap()
    }

    fn source_for(server: &MockServer) -> SourceConfig {
        let mut source = SourceConfig::new("Mock", &format!("{}/", server.uri()));
        source.endpoints.insert(
            "top_headlines".to_string(),
            "<BASE_URL>top-headlines".to_string(),
        );
        source
    }

    fn page(titles: &[&str]) -> serde_json::Value {
        let articles: Vec<_> = titles
            .iter()
            .map(|t| json!({"title": t, "url": format!("https://example.com/{t}")}))
            .collect();
        json!({"status": "ok", "articles": articles})
    }

    fn titles(articles: &[NormalizedArticle]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_merge_follows_submission_order() {
        let server = MockServer::start().await;
        let cases = [
            ("us", "tech", 300),
            ("us", "science", 0),
            ("gb", "tech", 150),
            ("gb", "science", 0),
        ];
        for (country, category, delay_ms) in cases {
            let first = format!("{country}-{category}-1");
            let second = format!("{country}-{category}-2");
            Mock::given(method("GET"))
                .and(path("/top-headlines"))
                .and(query_param("country", country))
                .and(query_param("category", category))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(page(&[first.as_str(), second.as_str()]))
                        .set_delay(Duration::from_millis(delay_ms)),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let mut source = source_for(&server);
        source.available_countries = vec!["us".into(), "gb".into()];
        source.available_categories = vec!["tech".into(), "science".into()];

        let articles = fetcher().fetch_source(&source).await;
        assert_eq!(
            titles(&articles),
            [
                "us-tech-1",
                "us-tech-2",
                "us-science-1",
                "us-science-2",
                "gb-tech-1",
                "gb-tech-2",
                "gb-science-1",
                "gb-science-2",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_dimensions_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("category", "broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("category", "garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("category", "fine"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["ok"])))
            .mount(&server)
            .await;

        let mut source = source_for(&server);
        source.available_categories = vec!["broken".into(), "garbled".into(), "fine".into()];

        let articles = fetcher().fetch_source(&source).await;
        assert_eq!(titles(&articles), ["ok"]);
    }

    #[tokio::test]
    async fn test_dimension_errors_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("category", "missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("category", "garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let f = fetcher();
        let missing = Dimension {
            country: None,
            category: Some("missing".into()),
        };
        let garbled = Dimension {
            country: None,
            category: Some("garbled".into()),
        };

        match f.fetch_dimension(&source, &missing).await {
            Err(FetchError::Status { status, .. }) => assert_eq!(status, StatusCode::NOT_FOUND),
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(matches!(
            f.fetch_dimension(&source, &garbled).await,
            Err(FetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_network_error_is_transport() {
        let mut source = SourceConfig::new("Dead", "http://127.0.0.1:1/");
        source.endpoints.insert("top_headlines".into(), "<BASE_URL>x".into());
        let result = fetcher().fetch_dimension(&source, &Dimension::default()).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
        assert!(fetcher().fetch_source(&source).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_endpoint_url() {
        let source = SourceConfig::new("Bad", "not a url");
        let result = fetcher().fetch_dimension(&source, &Dimension::default()).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_api_key_params_and_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .and(query_param("apiKey", "secret"))
            .and(query_param("pageSize", "20"))
            .and(query_param("language", "en"))
            .and(query_param_is_missing("country"))
            .and(query_param_is_missing("category"))
            .and(header("X-Client", "relay"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["keyed"])))
            .expect(1)
            .mount(&server)
            .await;

        let mut source = source_for(&server);
        source.api_key = Some("secret".into());
        source.default_params.insert("pageSize".into(), json!(20));
        source.default_params.insert("language".into(), json!("en"));
        source.headers.insert("X-Client".into(), "relay".into());

        let articles = fetcher().fetch_source(&source).await;
        assert_eq!(titles(&articles), ["keyed"]);
    }

    #[tokio::test]
    async fn test_custom_response_mapping_is_applied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"results": [
                    {"webTitle": "G", "webUrl": "https://g", "webPublicationDate": "2025-09-12T08:00:00Z"}
                ]}
            })))
            .mount(&server)
            .await;

        let mut source = source_for(&server);
        source.response_mapping.articles_path = "response.results".into();
        source.response_mapping.title_field = "webTitle".into();
        source.response_mapping.url_field = "webUrl".into();
        source.response_mapping.published_at_path = Some("webPublicationDate".into());

        let articles = fetcher().fetch_source(&source).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://g");
        assert_eq!(articles[0].published_at.as_deref(), Some("2025-09-12T08:00:00Z"));
    }
}
