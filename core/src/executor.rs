//! The I/O boundary: something that turns an `HttpRequest` into an
//! `HttpResponse`.
//!
//! # Design
//! `Okapi` never opens a connection itself. It hands a frozen request to an
//! `HttpExecutor` and interprets whatever comes back. A response of any
//! status is `Ok`; only failures to obtain a response are `Err`, and those
//! reach the caller unclassified. Timeouts, proxies and TLS settings belong
//! to the executor (e.g. through the `reqwest::Client` it wraps).

use std::future::Future;

use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

/// Performs the network round-trip for one request.
pub trait HttpExecutor {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse, Self::Error>> + Send;
}

/// Executor backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl From<reqwest::Client> for ReqwestExecutor {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

impl HttpExecutor for ReqwestExecutor {
    type Error = reqwest::Error;

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, reqwest::Error> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if request.attachments.is_empty() {
            builder = match &request.body {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.json(value),
                RequestBody::Form(fields) => builder.form(fields),
            };
        } else {
            let mut form = Form::new();
            if let RequestBody::Form(fields) = request.body {
                for (name, value) in fields {
                    form = form.text(name, value);
                }
            }
            for (name, attachment) in request.attachments {
                let mut part = Part::bytes(attachment.data.to_vec());
                if let Some(file_name) = attachment.file_name {
                    part = part.file_name(file_name);
                }
                if let Some(content_type) = attachment.content_type {
                    part = part.mime_str(&content_type)?;
                }
                form = form.part(name, part);
            }
            builder = builder.multipart(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;
        debug!(target: "okapi_sdk::executor", status, bytes = body.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
