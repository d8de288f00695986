//! REST news sources.
//!
//! Each configured source is queried once per *dimension*: a
//! (country, category) pair taken from the source's `available_countries`
//! and `available_categories`.
//!
//! | countries | categories | requests |
//! |-----------|------------|----------|
//! | `[us, gb]` | `[tech, science]` | 4, countries outer |
//! | `[us, gb]` | `[]` | 2 |
//! | `[]` | `[tech]` | 1 |
//! | `[]` | `[]` | 1, no dimension parameters |
//!
//! [`fetcher`] issues the requests concurrently and merges the mapped
//! articles in the order listed above.

pub mod fetcher;

use crate::config::SourceConfig;
use itertools::Itertools;
use std::fmt;
use tracing::warn;

/// One request's worth of filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dimension {
    pub country: Option<String>,
    pub category: Option<String>,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.country.as_deref().unwrap_or("*"),
            self.category.as_deref().unwrap_or("*")
        )
    }
}

/// Every dimension to request for `source`, in submission order.
pub fn dimensions(source: &SourceConfig) -> Vec<Dimension> {
    let countries = &source.available_countries;
    let categories = &source.available_categories;

    match (countries.is_empty(), categories.is_empty()) {
        (false, false) => countries
            .iter()
            .cartesian_product(categories.iter())
            .map(|(country, category)| Dimension {
                country: Some(country.clone()),
                category: Some(category.clone()),
            })
            .collect(),
        (false, true) => countries
            .iter()
            .map(|country| Dimension {
                country: Some(country.clone()),
                category: None,
            })
            .collect(),
        (true, false) => categories
            .iter()
            .map(|category| Dimension {
                country: None,
                category: Some(category.clone()),
            })
            .collect(),
        (true, true) => vec![Dimension::default()],
    }
}

/// Expand the source's endpoint template for one dimension.
///
/// Falls back to `base_url` when the configured template does not exist.
pub fn build_endpoint(source: &SourceConfig, dimension: &Dimension) -> String {
    let Some(template) = source.endpoints.get(&source.endpoint) else {
        warn!(source = %source.name, endpoint = %source.endpoint, "Endpoint template not configured; using base_url");
        return source.base_url.clone();
    };

    let country = dimension.country.as_deref().unwrap_or_default();
    let category = dimension.category.as_deref().unwrap_or_default();
    template
        .replace("<BASE_URL>", &source.base_url)
        .replace("<country>", &urlencoding::encode(country))
        .replace("<category>", &urlencoding::encode(category))
}

/// Query parameters for one dimension.
///
/// Scalar `default_params` come first (in key order), then the API key, then
/// the dimension itself. The dimension and the key win over defaults with
/// the same name.
pub fn query_params(source: &SourceConfig, dimension: &Dimension) -> Vec<(String, String)> {
    let mut overridden: Vec<&str> = Vec::new();
    if source.api_key.is_some() {
        overridden.push(&source.api_key_param);
    }
    if dimension.country.is_some() {
        overridden.push("country");
    }
    if dimension.category.is_some() {
        overridden.push("category");
    }

    let mut params: Vec<(String, String)> = source
        .default_params
        .iter()
        .filter(|(key, _)| !overridden.contains(&key.as_str()))
        .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key.clone(), v)))
        .collect();

    if let Some(key) = &source.api_key {
        params.push((source.api_key_param.clone(), key.clone()));
    }
    if let Some(country) = &dimension.country {
        params.push(("country".to_string(), country.clone()));
    }
    if let Some(category) = &dimension.category {
        params.push(("category".to_string(), category.clone()));
    }
    params
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> SourceConfig {
        let mut source = SourceConfig::new("NewsAPI", "https://newsapi.org/v2/");
        source.endpoints.insert(
            "top_headlines".to_string(),
            "<BASE_URL>top-headlines".to_string(),
        );
        source
    }

    fn dim(country: Option<&str>, category: Option<&str>) -> Dimension {
        Dimension {
            country: country.map(str::to_string),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn test_dimensions_cartesian_product_countries_outer() {
        let mut s = source();
        s.available_countries = vec!["us".into(), "gb".into()];
        s.available_categories = vec!["technology".into(), "science".into()];
        assert_eq!(
            dimensions(&s),
            vec![
                dim(Some("us"), Some("technology")),
                dim(Some("us"), Some("science")),
                dim(Some("gb"), Some("technology")),
                dim(Some("gb"), Some("science")),
            ]
        );
    }

    #[test]
    fn test_dimensions_single_axis() {
        let mut s = source();
        s.available_countries = vec!["us".into(), "gb".into()];
        assert_eq!(dimensions(&s), vec![dim(Some("us"), None), dim(Some("gb"), None)]);

        let mut s = source();
        s.available_categories = vec!["health".into()];
        assert_eq!(dimensions(&s), vec![dim(None, Some("health"))]);
    }

    #[test]
    fn test_dimensions_single_request_without_axes() {
        assert_eq!(dimensions(&source()), vec![Dimension::default()]);
    }

    #[test]
    fn test_build_endpoint_substitutes_placeholders() {
        let mut s = source();
        s.endpoints.insert(
            "by_section".to_string(),
            "<BASE_URL><country>/<category>.json".to_string(),
        );
        s.endpoint = "by_section".to_string();
        assert_eq!(
            build_endpoint(&s, &dim(Some("us"), Some("arts & culture"))),
            "https://newsapi.org/v2/us/arts%20%26%20culture.json"
        );
        assert_eq!(
            build_endpoint(&s, &Dimension::default()),
            "https://newsapi.org/v2//.json"
        );
    }

    #[test]
    fn test_build_endpoint_falls_back_to_base_url() {
        let mut s = source();
        s.endpoint = "everything".to_string();
        assert_eq!(build_endpoint(&s, &Dimension::default()), "https://newsapi.org/v2/");
    }

    #[test]
    fn test_query_params_order_and_overrides() {
        let mut s = source();
        s.default_params.insert("pageSize".into(), json!(20));
        s.default_params.insert("language".into(), json!("en"));
        s.default_params.insert("country".into(), json!("fr"));
        s.default_params.insert("nested".into(), json!({"skip": true}));
        s.default_params.insert("sortBy".into(), json!(null));
        s.api_key = Some("secret".into());

        let params = query_params(&s, &dim(Some("us"), None));
        let expected: Vec<(String, String)> = [
            ("language", "en"),
            ("pageSize", "20"),
            ("apiKey", "secret"),
            ("country", "us"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn test_query_params_keep_default_dimension_when_not_overridden() {
        let mut s = source();
        s.default_params.insert("country".into(), json!("fr"));
        let params = query_params(&s, &Dimension::default());
        assert_eq!(params, vec![("country".to_string(), "fr".to_string())]);
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(dim(Some("us"), None).to_string(), "us/*");
        assert_eq!(dim(None, Some("tech")).to_string(), "*/tech");
    }
}
