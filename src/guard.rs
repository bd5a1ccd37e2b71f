//! Navigation guard for protected views.

use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::config::ClientConfig;
use crate::navigation::{LoginRedirect, Navigator};

/// Decides whether a view may be entered. Synchronous, no network.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use pagedash::auth::CredentialStore;
/// use pagedash::config::ClientConfig;
/// use pagedash::guard::AuthGuard;
/// use pagedash::navigation::RouterState;
///
/// let router = Arc::new(RouterState::new("/"));
/// let guard = AuthGuard::new(
///     Arc::new(CredentialStore::in_memory()),
///     router.clone(),
///     &ClientConfig::default(),
/// );
/// assert!(!guard.can_activate("/dashboard/analiticas"));
/// assert_eq!(router.redirects()[0].return_url, "/dashboard/analiticas");
/// ```
pub struct AuthGuard {
    store: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    protected_routes: Vec<String>,
}

impl AuthGuard {
    pub fn new(
        store: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            store,
            navigator,
            login_route: config.login_route.clone(),
            protected_routes: config.protected_routes.clone(),
        }
    }

    /// Whether `url` falls under one of the protected view prefixes.
    pub fn is_protected(&self, url: &str) -> bool {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        self.protected_routes.iter().any(|route| {
            let route = route.trim_end_matches('/');
            path == route || path.strip_prefix(route).is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Allow entry to a protected view only for an authenticated session.
    ///
    /// On denial the user is sent to login with `url` as the return path.
    pub fn can_activate(&self, url: &str) -> bool {
        if self.store.is_authenticated() {
            return true;
        }
        tracing::debug!(url, "guard denied entry");
        self.navigator.redirect_to_login(LoginRedirect {
            login_route: self.login_route.clone(),
            return_url: url.to_string(),
        });
        false
    }

    /// Like [`can_activate`](Self::can_activate) but lets unprotected views through.
    pub fn check(&self, url: &str) -> bool {
        !self.is_protected(url) || self.can_activate(url)
    }
}
