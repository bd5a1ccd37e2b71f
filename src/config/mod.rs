//! Client configuration (layered: code > env > defaults).

pub mod routes;

pub use routes::{PathMatch, RouteClass, RouteRules};

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::PagedashError;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_API_PREFIX: &str = "/api/";
const DEFAULT_LOGIN_ROUTE: &str = "/login";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REFRESH_WAIT: Duration = Duration::from_secs(30);

/// Configuration for an [`ApiClient`](crate::pipeline::ApiClient) and its collaborators.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use pagedash::config::{ClientConfig, PathMatch};
///
/// let config = ClientConfig::new("https://dash.example.com")
///     .with_path_match(PathMatch::Exact)
///     .with_refresh_wait_timeout(Duration::from_secs(5));
/// assert_eq!(config.base_url, "https://dash.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme + host (+ optional port) the API lives on, without trailing slash.
    pub base_url: String,
    /// Path prefix of the API surface the pipeline manages.
    pub api_prefix: String,
    pub routes: RouteRules,
    /// View the navigator sends users to when they must sign in.
    pub login_route: String,
    /// View prefixes guarded by [`AuthGuard`](crate::guard::AuthGuard).
    pub protected_routes: Vec<String>,
    pub request_timeout: Duration,
    /// Upper bound for a request parked behind an in-flight refresh.
    pub refresh_wait_timeout: Duration,
    pub storage_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            routes: RouteRules::default(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            protected_routes: vec!["/dashboard".to_string()],
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_wait_timeout: DEFAULT_REFRESH_WAIT,
            storage_dir: default_storage_dir(),
        }
    }

    /// Load from environment variables (and a `.env` file if present).
    ///
    /// Recognized: `PAGEDASH_BASE_URL`, `PAGEDASH_API_PREFIX`,
    /// `PAGEDASH_PATH_MATCH`, `PAGEDASH_STORAGE_DIR`,
    /// `PAGEDASH_REQUEST_TIMEOUT_SECS`, `PAGEDASH_REFRESH_WAIT_SECS`.
    pub fn from_env() -> Result<Self, PagedashError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Used by [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PagedashError> {
        let mut config = match lookup("PAGEDASH_BASE_URL") {
            Some(url) => Self::new(url),
            None => Self::default(),
        };
        if let Some(prefix) = lookup("PAGEDASH_API_PREFIX") {
            config = config.with_api_prefix(prefix);
        }
        if let Some(mode) = lookup("PAGEDASH_PATH_MATCH") {
            let mode = PathMatch::from_str(mode.trim()).map_err(|_| {
                PagedashError::Configuration(format!(
                    "PAGEDASH_PATH_MATCH must be one of exact, segment, substring (got {mode:?})"
                ))
            })?;
            config = config.with_path_match(mode);
        }
        if let Some(dir) = lookup("PAGEDASH_STORAGE_DIR") {
            config = config.with_storage_dir(PathBuf::from(dir));
        }
        if let Some(secs) = lookup("PAGEDASH_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("PAGEDASH_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("PAGEDASH_REFRESH_WAIT_SECS") {
            config.refresh_wait_timeout = parse_secs("PAGEDASH_REFRESH_WAIT_SECS", &secs)?;
        }
        Ok(config)
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.starts_with('/') {
            prefix.insert(0, '/');
        }
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.api_prefix = prefix;
        self
    }

    pub fn with_routes(mut self, routes: RouteRules) -> Self {
        self.routes = routes;
        self
    }

    pub fn with_path_match(mut self, mode: PathMatch) -> Self {
        self.routes.match_mode = mode;
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_protected_routes(mut self, routes: Vec<String>) -> Self {
        self.protected_routes = routes;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_refresh_wait_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_wait_timeout = timeout;
        self
    }

    pub fn with_storage_dir(mut self, dir: PathBuf) -> Self {
        self.storage_dir = dir;
        self
    }

    /// Classify a request path against the configured rules.
    pub fn classify(&self, path: &str) -> RouteClass {
        self.routes.classify(path, &self.api_prefix)
    }

    /// Absolute URL for a request path. Absolute inputs are returned as-is.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, PagedashError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| PagedashError::Configuration(format!("{key} must be whole seconds (got {raw:?})")))
}

fn default_storage_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".pagedash"))
        .unwrap_or_else(|| PathBuf::from(".pagedash"))
}
