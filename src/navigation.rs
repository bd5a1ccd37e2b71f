//! Navigation seam: where the pipeline and guard send users who must sign in.

use std::sync::{Mutex, RwLock};

/// Redirect to the login view, remembering where the user was headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub login_route: String,
    pub return_url: String,
}

impl LoginRedirect {
    /// `/login?returnUrl=<encoded>`
    pub fn target(&self) -> String {
        let encoded = urlencoding::encode(&self.return_url);
        format!("{}?returnUrl={encoded}", self.login_route)
    }
}

/// The application's router, as seen by the auth layer.
pub trait Navigator: Send + Sync {
    /// URL of the view the user is currently on.
    fn current_url(&self) -> String;
    /// Leave the current view for the login view.
    fn redirect_to_login(&self, redirect: LoginRedirect);
}

/// Whether `url` already points at the login view.
pub fn is_login_url(url: &str, login_route: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let login = login_route.trim_end_matches('/');
    path == login || path.strip_prefix(login).is_some_and(|rest| rest.starts_with('/'))
}

/// In-process router state: current URL plus a log of login redirects.
///
/// # Example
/// ```
/// use pagedash::navigation::{LoginRedirect, Navigator, RouterState};
///
/// let router = RouterState::new("/dashboard/analiticas");
/// router.redirect_to_login(LoginRedirect {
///     login_route: "/login".into(),
///     return_url: "/dashboard/analiticas".into(),
/// });
/// assert_eq!(router.current_url(), "/login?returnUrl=%2Fdashboard%2Fanaliticas");
/// assert_eq!(router.redirects().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RouterState {
    current: RwLock<String>,
    redirects: Mutex<Vec<LoginRedirect>>,
}

impl RouterState {
    pub fn new(current_url: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(current_url.into()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Move to another view.
    pub fn navigate(&self, url: impl Into<String>) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = url.into();
    }

    /// Login redirects issued so far, oldest first.
    pub fn redirects(&self) -> Vec<LoginRedirect> {
        self.redirects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for RouterState {
    fn current_url(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn redirect_to_login(&self, redirect: LoginRedirect) {
        tracing::info!(return_url = %redirect.return_url, "redirecting to login");
        self.navigate(redirect.target());
        self.redirects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(redirect);
    }
}
