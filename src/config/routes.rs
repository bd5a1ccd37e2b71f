//! Request classification: which paths are public, which need a bearer token.

use strum::{Display, EnumString};

pub const LOGIN_PATH: &str = "/api/Token/login";
pub const REGISTER_PATH: &str = "/api/Token/register";
pub const REFRESH_PATH: &str = "/api/Token/refresh";

/// How public-path rules are compared against a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PathMatch {
    /// Path (without query) equals the rule.
    Exact,
    /// Path equals the rule or continues it with a `/` segment.
    #[default]
    Segment,
    /// The rule appears anywhere in the request target. Permissive: it also
    /// matches `/api/Token/login-something`.
    Substring,
}

/// Dispatch class of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RouteClass {
    /// Sent unmodified, no 401 recovery.
    Public,
    /// The token-refresh endpoint: carries the expiring token, a 401 is terminal.
    Refresh,
    /// Needs a bearer token; 401 triggers refresh coordination.
    Protected,
    /// Outside the API surface; passed through untouched.
    External,
}

/// Public-path allow-list plus the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRules {
    pub login_path: String,
    pub register_path: String,
    pub refresh_path: String,
    pub extra_public_paths: Vec<String>,
    pub match_mode: PathMatch,
}

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            login_path: LOGIN_PATH.to_string(),
            register_path: REGISTER_PATH.to_string(),
            refresh_path: REFRESH_PATH.to_string(),
            extra_public_paths: Vec::new(),
            match_mode: PathMatch::default(),
        }
    }
}

impl RouteRules {
    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.extra_public_paths.push(path.into());
        self
    }

    /// Classify `target` (a path, optionally with query) for dispatch.
    pub fn classify(&self, target: &str, api_prefix: &str) -> RouteClass {
        if is_absolute(target) {
            return RouteClass::External;
        }
        if self.matches(target, &self.refresh_path) {
            return RouteClass::Refresh;
        }
        let public = [&self.login_path, &self.register_path]
            .into_iter()
            .chain(self.extra_public_paths.iter())
            .any(|rule| self.matches(target, rule));
        if public {
            return RouteClass::Public;
        }
        if target.starts_with(api_prefix) {
            RouteClass::Protected
        } else {
            RouteClass::External
        }
    }

    fn matches(&self, target: &str, rule: &str) -> bool {
        if rule.is_empty() {
            return false;
        }
        match self.match_mode {
            PathMatch::Substring => target.contains(rule),
            PathMatch::Exact => path_only(target) == rule,
            PathMatch::Segment => {
                let path = path_only(target);
                let rule = rule.trim_end_matches('/');
                path == rule
                    || path
                        .strip_prefix(rule)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

fn is_absolute(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

fn path_only(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}
