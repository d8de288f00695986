//! Dot-path lookup into arbitrary JSON payloads.
//!
//! Sources disagree about where they keep things (`articles`,
//! `response.results`, `meta.published`, ...). Both lookups here are total:
//! any shape of input yields either a value or `None`/empty, never a panic.

use serde_json::Value;

/// Resolve a dot-separated `path` against `root`.
///
/// Returns `None` when the path is absent or empty, when an intermediate
/// value is not an object, when a key is missing, or when the final value
/// is `null`.
pub fn resolve<'a>(root: &'a Value, path: Option<&str>) -> Option<&'a Value> {
    let path = path?;
    if path.is_empty() {
        return None;
    }

    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Resolve `path` and view the result as a list.
///
/// Anything that is not an array, including a missing value, comes back as
/// an empty slice so callers can iterate unconditionally.
pub fn resolve_list<'a>(root: &'a Value, path: Option<&str>) -> &'a [Value] {
    resolve(root, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Resolve `path` and return it only if it is a non-blank string.
pub fn resolve_str<'a>(root: &'a Value, path: Option<&str>) -> Option<&'a str> {
    resolve(root, path)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_path_resolves() {
        let root = json!({"meta": {"published": "2025-09-12T08:00:00Z"}});
        assert_eq!(
            resolve(&root, Some("meta.published")),
            Some(&json!("2025-09-12T08:00:00Z"))
        );
    }

    #[test]
    fn test_missing_key_is_none() {
        let root = json!({"meta": {}});
        assert_eq!(resolve(&root, Some("meta.published")), None);
    }

    #[test]
    fn test_absent_or_empty_path_is_none() {
        let root = json!({"a": 1});
        assert_eq!(resolve(&root, None), None);
        assert_eq!(resolve(&root, Some("")), None);
    }

    #[test]
    fn test_non_object_intermediate_is_none() {
        let root = json!({"meta": "flat string", "list": [{"x": 1}]});
        assert_eq!(resolve(&root, Some("meta.published")), None);
        assert_eq!(resolve(&root, Some("list.x")), None);
        assert_eq!(resolve(&json!(42), Some("anything")), None);
    }

    #[test]
    fn test_null_value_is_none() {
        let root = json!({"meta": {"published": null}, "gone": null});
        assert_eq!(resolve(&root, Some("meta.published")), None);
        assert_eq!(resolve(&root, Some("gone.deeper")), None);
    }

    #[test]
    fn test_non_string_values_are_returned_raw() {
        let root = json!({"published_at": 123456});
        assert_eq!(resolve(&root, Some("published_at")), Some(&json!(123456)));
        assert_eq!(resolve_str(&root, Some("published_at")), None);
    }

    #[test]
    fn test_resolve_list_coerces_to_empty() {
        let root = json!({
            "articles": [{"title": "a"}, {"title": "b"}],
            "response": {"results": {"not": "a list"}},
        });
        assert_eq!(resolve_list(&root, Some("articles")).len(), 2);
        assert!(resolve_list(&root, Some("response.results")).is_empty());
        assert!(resolve_list(&root, Some("missing")).is_empty());
        assert!(resolve_list(&root, None).is_empty());
        assert!(resolve_list(&json!([1, 2]), Some("articles")).is_empty());
    }

    #[test]
    fn test_resolve_str_rejects_blank() {
        let root = json!({"title": "   ", "url": "https://example.com"});
        assert_eq!(resolve_str(&root, Some("title")), None);
        assert_eq!(resolve_str(&root, Some("url")), Some("https://example.com"));
    }
}
