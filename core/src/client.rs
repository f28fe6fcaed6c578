//! Fluent builder for gateway calls.
//!
//! # Design
//! `Okapi` pairs a `RequestContext` with an injected `HttpExecutor`.
//! Configuration methods mutate the context and return `&mut Self` so they
//! chain; a verb (`get`, `post`, ...) freezes the context into an
//! `HttpRequest`, awaits the executor and maps the response. Verbs borrow
//! the builder mutably for the whole call, so one builder never has two
//! requests in flight.
//!
//! The context is not cleared after a call. A reused builder keeps its
//! headers, body, query and attachments until `reset` is called.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ClientConfig;
use crate::context::{ContentMode, RequestContext, RequestOptions, Target};
use crate::error::{ApiError, HttpError, TemplateError};
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::http::{Attachment, HttpMethod, HttpResponse, ResponseMeta};
use crate::uri::substitute_params;

/// Chainable client for one gateway.
#[derive(Debug, Clone)]
pub struct Okapi<E = ReqwestExecutor> {
    config: ClientConfig,
    ctx: RequestContext,
    executor: E,
}

impl Okapi<ReqwestExecutor> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_executor(config, ReqwestExecutor::default())
    }
}

impl Default for Okapi<ReqwestExecutor> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<E> Okapi<E> {
    pub fn with_executor(config: ClientConfig, executor: E) -> Self {
        let ctx = RequestContext::new(&config);
        Self {
            config,
            ctx,
            executor,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Restore the construction-time context.
    pub fn reset(&mut self) -> &mut Self {
        self.ctx = RequestContext::new(&self.config);
        self
    }

    pub fn api(&mut self, api: impl Into<String>) -> &mut Self {
        self.ctx.api = Some(api.into());
        self.ctx.rebuild_uri();
        self
    }

    pub fn version(&mut self, version: impl ToString) -> &mut Self {
        self.ctx.version = Some(version.to_string());
        self.ctx.rebuild_uri();
        self
    }

    pub fn resource(&mut self, resource: impl Into<String>) -> &mut Self {
        self.ctx.resource = Some(resource.into());
        self.ctx.rebuild_uri();
        self
    }

    /// Set the uri verbatim; api, version and resource are parsed back out
    /// of it.
    pub fn uri(&mut self, uri: &str) -> &mut Self {
        self.ctx.set_uri(uri);
        self
    }

    /// Fill the `:name` placeholders of the current uri.
    ///
    /// Only the uri changes; api, version and resource keep their
    /// placeholders, so a later `api`/`version`/`resource` call brings them
    /// back.
    pub fn params(&mut self, data: &Map<String, Value>) -> Result<&mut Self, TemplateError> {
        self.ctx.uri = substitute_params(&self.ctx.uri, data)?;
        Ok(self)
    }

    pub fn body(&mut self, body: impl Into<Value>) -> &mut Self {
        self.ctx.body = Some(body.into());
        self
    }

    /// Like [`body`](Self::body) for any serializable value.
    pub fn body_json<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<&mut Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.body(value))
    }

    pub fn query(&mut self, query: impl Into<Value>) -> &mut Self {
        self.ctx.query = Some(query.into());
        self
    }

    /// Send `form` url-encoded instead of a JSON body. The switch holds
    /// until `reset`.
    pub fn form(&mut self, form: impl Into<Value>) -> &mut Self {
        self.ctx.form = Some(form.into());
        self.ctx.content_mode = ContentMode::Form;
        self
    }

    /// Add multipart fields; a name already present is replaced, others
    /// are kept.
    pub fn attachment<K>(&mut self, parts: impl IntoIterator<Item = (K, Attachment)>) -> &mut Self
    where
        K: Into<String>,
    {
        self.ctx.merge_attachments(parts);
        self
    }

    /// Merge one header mapping; later keys overwrite earlier ones.
    pub fn headers<K, V>(&mut self, headers: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.ctx.merge_headers(headers);
        self
    }

    /// Merge a sequence of header mappings in order.
    pub fn headers_seq<I, K, V>(&mut self, maps: impl IntoIterator<Item = I>) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for map in maps {
            self.ctx.merge_headers(map);
        }
        self
    }

    /// Apply a whole configuration record.
    ///
    /// Fields are applied as uri, api, version, resource, body, query and
    /// attachment, then the uri is rebuilt from its components, so
    /// api/version/resource always win over `uri`. `params` runs last, on
    /// the rebuilt uri.
    pub fn build(&mut self, options: RequestOptions) -> Result<&mut Self, TemplateError> {
        let RequestOptions {
            api,
            version,
            resource,
            uri,
            body,
            query,
            params,
            attachment,
        } = options;

        if let Some(uri) = uri {
            self.ctx.set_uri(&uri);
        }
        if let Some(api) = api {
            self.ctx.api = Some(api);
        }
        if let Some(version) = version {
            self.ctx.version = Some(version);
        }
        if let Some(resource) = resource {
            self.ctx.resource = Some(resource);
        }
        if let Some(body) = body {
            self.ctx.body = Some(body);
        }
        if let Some(query) = query {
            self.ctx.query = Some(query);
        }
        if let Some(attachment) = attachment {
            self.ctx.merge_attachments(attachment);
        }
        self.ctx.rebuild_uri();
        match params {
            Some(params) => self.params(&params),
            None => Ok(self),
        }
    }

    /// Read-only view of the pending call.
    pub fn info(&self) -> &RequestContext {
        &self.ctx
    }

    /// `<base_url>/<uri>` for the current context.
    pub fn to_url(&self) -> String {
        self.ctx.url()
    }

    /// Apply `options` and return the resulting url.
    pub fn to_url_with(&mut self, options: RequestOptions) -> Result<String, TemplateError> {
        self.build(options)?;
        Ok(self.to_url())
    }

    fn target(&mut self, target: Target) -> Result<(), TemplateError> {
        match target {
            Target::Current => {}
            Target::Path(path) => {
                if self.ctx.api.as_deref().is_some_and(|api| !api.is_empty()) {
                    self.resource(path);
                } else {
                    self.uri(&path);
                }
            }
            Target::Options(options) => {
                self.build(options)?;
            }
        }
        Ok(())
    }
}

impl<E: HttpExecutor> Okapi<E> {
    pub async fn get(&mut self) -> Result<(Value, ResponseMeta), ApiError> {
        self.send(HttpMethod::Get, Target::Current).await
    }

    pub async fn post(&mut self) -> Result<(Value, ResponseMeta), ApiError> {
        self.send(HttpMethod::Post, Target::Current).await
    }

    pub async fn put(&mut self) -> Result<(Value, ResponseMeta), ApiError> {
        self.send(HttpMethod::Put, Target::Current).await
    }

    pub async fn patch(&mut self) -> Result<(Value, ResponseMeta), ApiError> {
        self.send(HttpMethod::Patch, Target::Current).await
    }

    pub async fn delete(&mut self) -> Result<(Value, ResponseMeta), ApiError> {
        self.send(HttpMethod::Delete, Target::Current).await
    }

    /// Point the context at `target`, then issue one `method` request.
    ///
    /// Resolves to the parsed body and the response metadata. Statuses
    /// >= 400 become [`ApiError::Http`]; executor failures are returned as
    /// [`ApiError::Transport`].
    pub async fn send(
        &mut self,
        method: HttpMethod,
        target: impl Into<Target>,
    ) -> Result<(Value, ResponseMeta), ApiError> {
        self.ctx.method = method;
        self.target(target.into())?;

        let request = self.ctx.to_request();
        debug!(target: "okapi_sdk::client", method = %request.method, url = %request.url, "sending request");
        let response = self
            .executor
            .execute(request)
            .await
            .map_err(|e| ApiError::Transport(Box::new(e)))?;

        parse_response(self.ctx.content_mode, response).map_err(ApiError::from)
    }
}

/// Split a response into body and metadata, or an `HttpError` for
/// statuses >= 400.
///
/// Bodies are parsed as JSON in JSON mode and fall back to the raw text.
/// In form mode the raw text is returned. Error bodies are always tried as
/// JSON so `code` and `message` stay reachable. An empty body is `null`.
fn parse_response(mode: ContentMode, response: HttpResponse) -> Result<(Value, ResponseMeta), HttpError> {
    if response.status >= 400 {
        return Err(HttpError::new(response.status, parse_body(ContentMode::Json, response.body)));
    }
    let meta = ResponseMeta {
        status: response.status,
        headers: response.headers,
    };
    Ok((parse_body(mode, response.body), meta))
}

fn parse_body(mode: ContentMode, raw: String) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match mode {
        ContentMode::Json => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        ContentMode::Form => Value::String(raw),
    }
}
