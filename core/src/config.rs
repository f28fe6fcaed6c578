//! Construction-time configuration for `Okapi`.

use serde::Deserialize;

/// Gateway used when no base url is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.laposte.fr";

/// Environment variable read by [`ClientConfig::from_env`] for the base url.
pub const BASE_URL_ENV: &str = "OKAPI_BASE_URL";

/// Environment variable read by [`ClientConfig::from_env`] for the app key.
pub const APP_KEY_ENV: &str = "OKAPI_APP_KEY";

/// Where to send requests and which application key to present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub base_url: String,
    pub app_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_key: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            app_key: None,
        }
    }

    pub fn with_app_key(mut self, app_key: impl Into<String>) -> Self {
        self.app_key = Some(app_key.into());
        self
    }

    /// Read `OKAPI_BASE_URL` and `OKAPI_APP_KEY`, falling back to the
    /// defaults for anything unset or empty.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            base_url: read(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            app_key: read(APP_KEY_ENV),
        }
    }

    /// The base url without trailing slashes.
    pub(crate) fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}
