use tracing::debug;

/// Environment variable selecting the backend host.
pub const BASE_URL_ENV: &str = "EVENTHUB_API_URL";

/// Backend used when [`BASE_URL_ENV`] is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Image shown for users and teams without an uploaded avatar.
pub const DEFAULT_AVATAR: &str = "/img/icons/default-avatar.svg";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    /// Create a configuration pointing at `base_url`. A trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the base URL from the environment, falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                debug!(%url, "using base url from environment");
                Self::new(url.trim())
            }
            _ => Self::default(),
        }
    }

    /// Build an absolute endpoint URL from a path such as `/events/3`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a backend-relative asset path (e.g. `/media/avatars/x.jpg`) into an
    /// absolute URL. Absolute URLs pass through; a missing path yields the
    /// default avatar.
    pub fn resolve_asset_url(&self, path: Option<&str>) -> String {
        match path {
            None | Some("") => DEFAULT_AVATAR.to_string(),
            Some(p) if p.starts_with("http") => p.to_string(),
            Some(p) => self.endpoint(p),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
