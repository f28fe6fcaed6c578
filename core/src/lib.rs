//! Fluent client for versioned resources behind an Okapi gateway.
//!
//! # Overview
//! `Okapi` is a chainable builder: configuration calls describe the next
//! request (`api`, `version`, `resource`, `uri`, `params`, `body`, `form`,
//! `query`, `attachment`, `headers`) and a verb (`get`, `post`, `put`,
//! `patch`, `delete`) sends it through an injected `HttpExecutor`.
//!
//! ```no_run
//! # async fn demo() -> Result<(), okapi_sdk::ApiError> {
//! use okapi_sdk::{ClientConfig, Okapi};
//!
//! let mut oka = Okapi::new(ClientConfig::new("http://localhost:3000").with_app_key("secret"));
//! let (data, meta) = oka.api("myapi").version(1).resource("myresource").get().await?;
//! assert_eq!(meta.status, 200);
//! # let _ = data;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Paths are `<api>/v<version>/<resource>`; see [`uri`].
//! - The builder freezes its state into a plain-data `HttpRequest`; the
//!   executor owns all I/O, so the builder is testable with canned
//!   responses.
//! - [`tls::check_server_identity`] matches a host against a certificate's
//!   DNS alternative names, accepting wildcard names.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod http;
pub mod tls;
pub mod uri;

pub use client::Okapi;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use context::{ContentMode, RequestContext, RequestOptions, Target, APP_KEY_HEADER};
pub use error::{ApiError, HttpError, TemplateError};
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use http::{Attachment, HttpMethod, HttpRequest, HttpResponse, RequestBody, ResponseMeta};
pub use tls::{check_server_identity, check_server_identity_with, PeerCertificate, WildcardPolicy};
pub use uri::{build_uri, parse_uri, substitute_params, UriParts};
