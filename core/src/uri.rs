//! Gateway path construction, parsing and templating.
//!
//! # Design
//! A gateway path has the shape `<api>/v<version>/<resource...>`. The three
//! free functions here convert between that string and its components and
//! fill `:name` placeholders. They are pure and perform no escaping beyond
//! joining segments with `/`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::TemplateError;

static PARAM_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("param token pattern is valid"));

/// The three logical components of a gateway path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub api: Option<String>,
    pub version: Option<String>,
    pub resource: Option<String>,
}

/// Non-empty `/`-separated segments of `path`.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Join `api`, `v<version>` and the non-empty segments of `resource`.
///
/// An empty `api` or `version` contributes no segment, so a context with
/// only an api set resolves to just that api.
pub fn build_uri(api: &str, version: &str, resource: &str) -> String {
    let version = (!version.is_empty()).then(|| format!("v{version}"));
    Some(api)
        .filter(|a| !a.is_empty())
        .into_iter()
        .chain(version.as_deref())
        .chain(segments(resource))
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a raw path back into api, version and resource.
///
/// The second segment loses a leading `v` when it has one and is kept
/// verbatim otherwise, so `myapi/2/x` parses to version `2` just like
/// `myapi/v2/x`. Every segment after the second lands in `resource`.
pub fn parse_uri(raw: &str) -> UriParts {
    let mut parts = segments(raw);
    let api = parts.next().map(str::to_string);
    let version = parts
        .next()
        .map(|v| v.strip_prefix('v').unwrap_or(v).to_string());
    let rest: Vec<&str> = parts.collect();
    let resource = (!rest.is_empty()).then(|| rest.join("/"));
    UriParts {
        api,
        version,
        resource,
    }
}

/// Replace every `:name` token in `template` with `data[name]`.
///
/// Strings are inserted as-is, numbers and booleans through their JSON
/// rendering. A token without a usable value fails the whole substitution;
/// no partially filled path is ever returned.
pub fn substitute_params(template: &str, data: &Map<String, Value>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for token in PARAM_TOKEN.find_iter(template) {
        let name = &token.as_str()[1..];
        let value = match data.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Null) | None => return Err(TemplateError::MissingParam(name.to_string())),
            Some(_) => return Err(TemplateError::InvalidParam(name.to_string())),
        };
        out.push_str(&template[last..token.start()]);
        out.push_str(&value);
        last = token.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn build_joins_all_three_components() {
        assert_eq!(build_uri("myapi", "1", "contacts"), "myapi/v1/contacts");
    }

    #[test]
    fn build_drops_empty_resource_segments() {
        assert_eq!(build_uri("a", "1", "b//c/"), "a/v1/b/c");
        assert_eq!(build_uri("a", "1", "/b"), "a/v1/b");
    }

    #[test]
    fn build_keeps_multi_segment_resource() {
        assert_eq!(build_uri("myapi", "2", "contacts/:id/notes"), "myapi/v2/contacts/:id/notes");
    }

    #[test]
    fn build_skips_missing_components() {
        assert_eq!(build_uri("baduri", "", ""), "baduri");
        assert_eq!(build_uri("", "1", "x"), "v1/x");
        assert_eq!(build_uri("", "", ""), "");
    }

    #[test]
    fn parse_splits_into_three_parts() {
        let parts = parse_uri("myapi/v1/contacts/5");
        assert_eq!(parts.api.as_deref(), Some("myapi"));
        assert_eq!(parts.version.as_deref(), Some("1"));
        assert_eq!(parts.resource.as_deref(), Some("contacts/5"));
    }

    #[test]
    fn parse_keeps_unprefixed_version_verbatim() {
        let parts = parse_uri("myapi/2/contacts");
        assert_eq!(parts.version.as_deref(), Some("2"));

        let parts = parse_uri("myapi/beta/contacts");
        assert_eq!(parts.version.as_deref(), Some("beta"));
    }

    #[test]
    fn parse_strips_only_one_leading_v() {
        let parts = parse_uri("myapi/vv3");
        assert_eq!(parts.version.as_deref(), Some("v3"));
        assert!(parts.resource.is_none());
    }

    #[test]
    fn parse_ignores_empty_segments() {
        let parts = parse_uri("//myapi//v1///a//b/");
        assert_eq!(parts.api.as_deref(), Some("myapi"));
        assert_eq!(parts.version.as_deref(), Some("1"));
        assert_eq!(parts.resource.as_deref(), Some("a/b"));
    }

    #[test]
    fn parse_short_paths() {
        assert_eq!(parse_uri(""), UriParts::default());
        let parts = parse_uri("myapi");
        assert_eq!(parts.api.as_deref(), Some("myapi"));
        assert!(parts.version.is_none());
        assert!(parts.resource.is_none());
    }

    #[test]
    fn substitute_replaces_token() {
        let out = substitute_params("contacts/:id", &map(json!({ "id": 5 }))).unwrap();
        assert_eq!(out, "contacts/5");
    }

    #[test]
    fn substitute_replaces_repeated_and_adjacent_tokens() {
        let data = map(json!({ "a": "x", "b": true }));
        let out = substitute_params("p/:a/q/:a/:b", &data).unwrap();
        assert_eq!(out, "p/x/q/x/true");
    }

    #[test]
    fn substitute_does_not_escape_values() {
        let data = map(json!({ "id": "a b/c" }));
        assert_eq!(substitute_params("c/:id", &data).unwrap(), "c/a b/c");
    }

    #[test]
    fn substitute_fails_on_missing_key() {
        let err = substitute_params("contacts/:id", &Map::new()).unwrap_err();
        assert_eq!(err, TemplateError::MissingParam("id".to_string()));
    }

    #[test]
    fn substitute_fails_on_null_value() {
        let err = substitute_params("contacts/:id", &map(json!({ "id": null }))).unwrap_err();
        assert!(matches!(err, TemplateError::MissingParam(_)));
    }

    #[test]
    fn substitute_fails_on_structured_value() {
        let err = substitute_params("contacts/:id", &map(json!({ "id": [1, 2] }))).unwrap_err();
        assert_eq!(err, TemplateError::InvalidParam("id".to_string()));
    }

    #[test]
    fn substitute_without_tokens_is_identity() {
        assert_eq!(substitute_params("", &Map::new()).unwrap(), "");
        assert_eq!(substitute_params("a/v1/b", &Map::new()).unwrap(), "a/v1/b");
    }
}
