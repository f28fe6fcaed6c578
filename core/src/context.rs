//! The mutable record behind one `Okapi` builder.
//!
//! # Design
//! `RequestContext` owns every field a pending call needs and keeps `uri`
//! in step with `api` / `version` / `resource`. Setting `uri` directly
//! re-derives the three components instead. `to_request` freezes the record
//! into an `HttpRequest` without consuming it, so a builder can be reused.
//!
//! `RequestOptions` is the record form of the chain: every field is
//! optional and applied through the same setters.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::ClientConfig;
use crate::http::{Attachment, HttpMethod, HttpRequest, RequestBody};
use crate::uri::{build_uri, parse_uri};

/// Header carrying the application key.
pub const APP_KEY_HEADER: &str = "x-okapi-key";

/// How the request payload is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentMode {
    #[default]
    Json,
    Form,
}

/// State of one pending gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub base_url: String,
    pub method: HttpMethod,
    pub app_key: Option<String>,
    pub headers: Vec<(String, String)>,
    pub api: Option<String>,
    pub version: Option<String>,
    pub resource: Option<String>,
    pub uri: String,
    pub body: Option<Value>,
    pub form: Option<Value>,
    pub content_mode: ContentMode,
    pub query: Option<Value>,
    pub attachments: Vec<(String, Attachment)>,
}

impl RequestContext {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.normalized_base_url(),
            method: HttpMethod::Get,
            app_key: config.app_key.clone(),
            headers: Vec::new(),
            api: None,
            version: None,
            resource: None,
            uri: String::new(),
            body: None,
            form: None,
            content_mode: ContentMode::Json,
            query: None,
            attachments: Vec::new(),
        }
    }

    pub(crate) fn rebuild_uri(&mut self) {
        self.uri = build_uri(
            self.api.as_deref().unwrap_or_default(),
            self.version.as_deref().unwrap_or_default(),
            self.resource.as_deref().unwrap_or_default(),
        );
    }

    /// Store `raw` as the uri and re-derive api, version and resource from it.
    /// Components absent from `raw` keep their previous values.
    pub(crate) fn set_uri(&mut self, raw: &str) {
        let parts = parse_uri(raw);
        self.uri = raw.to_string();
        if parts.api.is_some() {
            self.api = parts.api;
        }
        if parts.version.is_some() {
            self.version = parts.version;
        }
        if parts.resource.is_some() {
            self.resource = parts.resource;
        }
    }

    pub(crate) fn merge_headers<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in pairs {
            merge_entry(&mut self.headers, name.into(), value.into());
        }
    }

    pub(crate) fn merge_attachments<K>(&mut self, parts: impl IntoIterator<Item = (K, Attachment)>)
    where
        K: Into<String>,
    {
        for (name, attachment) in parts {
            merge_entry(&mut self.attachments, name.into(), attachment);
        }
    }

    /// `<base_url>/<uri>`.
    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.uri)
    }

    /// Freeze the current state into a transport request.
    pub fn to_request(&self) -> HttpRequest {
        let mut headers = self.headers.clone();
        if let Some(key) = &self.app_key {
            merge_entry(&mut headers, APP_KEY_HEADER.to_string(), key.clone());
        }

        let body = match self.content_mode {
            ContentMode::Form => RequestBody::Form(
                self.form
                    .as_ref()
                    .map(|form| flatten_fields("form", form))
                    .unwrap_or_default(),
            ),
            ContentMode::Json => match &self.body {
                Some(body) => RequestBody::Json(body.clone()),
                None => RequestBody::Empty,
            },
        };

        if !self.attachments.is_empty() && matches!(body, RequestBody::Json(_)) {
            warn!(target: "okapi_sdk::context", "JSON body is not sent alongside multipart attachments");
        }

        HttpRequest {
            method: self.method,
            url: self.url(),
            headers,
            query: self
                .query
                .as_ref()
                .map(|query| flatten_fields("query", query))
                .unwrap_or_default(),
            body,
            attachments: self.attachments.clone(),
        }
    }
}

/// Replace the value under `key`, or append it when the key is new.
fn merge_entry<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

/// Turn a JSON object into string pairs for a query string or form body.
///
/// Arrays repeat their key once per item and `null` values are skipped.
fn flatten_fields(what: &str, value: &Value) -> Vec<(String, String)> {
    let Some(object) = value.as_object() else {
        warn!(target: "okapi_sdk::context", "ignoring {what} that is not a JSON object");
        return Vec::new();
    };
    let mut pairs = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(scalar_text).map(|v| (key.clone(), v)));
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A whole request configuration in one record.
///
/// Deserializing ignores unknown keys, so a loosely shaped JSON object can
/// be turned into options directly. Attachments cannot be deserialized.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub api: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub version: Option<String>,
    pub resource: Option<String>,
    pub uri: Option<String>,
    pub body: Option<Value>,
    pub query: Option<Value>,
    pub params: Option<Map<String, Value>>,
    #[serde(skip)]
    pub attachment: Option<Vec<(String, Attachment)>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api(mut self, api: impl Into<String>) -> Self {
        self.api = Some(api.into());
        self
    }

    pub fn version(mut self, version: impl ToString) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn query(mut self, query: impl Into<Value>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn attachment(mut self, name: impl Into<String>, attachment: Attachment) -> Self {
        self.attachment
            .get_or_insert_with(Vec::new)
            .push((name.into(), attachment));
        self
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number for version, got {other}"
        ))),
    }
}

/// What a verb call is pointed at.
///
/// A bare path is a resource when the context already names an api and a
/// full uri otherwise.
#[derive(Debug, Clone, Default)]
pub enum Target {
    #[default]
    Current,
    Path(String),
    Options(RequestOptions),
}

impl From<()> for Target {
    fn from(_: ()) -> Self {
        Target::Current
    }
}

impl From<&str> for Target {
    fn from(path: &str) -> Self {
        Target::Path(path.to_string())
    }
}

impl From<String> for Target {
    fn from(path: String) -> Self {
        Target::Path(path)
    }
}

impl From<RequestOptions> for Target {
    fn from(options: RequestOptions) -> Self {
        Target::Options(options)
    }
}
