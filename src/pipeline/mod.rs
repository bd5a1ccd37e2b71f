//! Authenticated request pipeline.
//!
//! Every call goes through [`ApiClient::execute`]:
//! - public routes (login, register) are sent untouched;
//! - protected routes get `Authorization: Bearer <token>`;
//! - a 401 on a protected route joins the single-flight refresh and the
//!   original request is replayed once with the new token;
//! - a refresh that fails ends the session (store cleared, login redirect).

pub mod refresh;

pub use refresh::{RefreshCoordinator, RefreshLeader, RefreshOutcome, RefreshTicket, RefreshWaiter};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::auth::{AuthError, CredentialStore, FileStorage};
use crate::config::{ClientConfig, RouteClass};
use crate::error::PagedashError;
use crate::http::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
use crate::models::{Envelope, SessionData};
use crate::navigation::{is_login_url, LoginRedirect, Navigator, RouterState};

/// HTTP client for the dashboard API with transparent token refresh.
///
/// Cheap to share behind an `Arc`; all state lives in the injected
/// collaborators.
///
/// # Example
/// ```no_run
/// use pagedash::config::ClientConfig;
/// use pagedash::pipeline::ApiClient;
///
/// # async fn example() -> pagedash::error::Result<()> {
/// let client = ApiClient::from_config(ClientConfig::from_env()?)?;
/// let pages: serde_json::Value = client.get_json("/api/Facebook/pages").await?;
/// println!("{pages}");
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    refresh: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("refreshing", &self.refresh.is_refreshing())
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            navigator,
            refresh: Arc::new(RefreshCoordinator::new()),
        }
    }

    /// Reqwest transport, file-backed credentials under `config.storage_dir`,
    /// and an in-process router.
    pub fn from_config(config: ClientConfig) -> Result<Self, PagedashError> {
        let transport = Arc::new(ReqwestTransport::new(config.clone())?);
        let store = Arc::new(CredentialStore::new(Arc::new(FileStorage::new(
            config.storage_dir.clone(),
        ))));
        let navigator = Arc::new(RouterState::new("/"));
        Ok(Self::new(config, transport, store, navigator))
    }

    /// Share one refresh coordinator between several clients of the same session.
    pub fn with_coordinator(mut self, coordinator: Arc<RefreshCoordinator>) -> Self {
        self.refresh = coordinator;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.refresh
    }

    /// Dispatch a request through the pipeline.
    ///
    /// 2xx responses are returned; anything else becomes a [`PagedashError`].
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, PagedashError> {
        let class = self.config.classify(request.path());
        tracing::debug!(method = %request.method(), path = request.path(), %class, "dispatch");
        match class {
            RouteClass::Public | RouteClass::External => {
                self.transport.send(&request).await?.into_result()
            }
            RouteClass::Refresh => self.execute_refresh_route(request).await,
            RouteClass::Protected => self.execute_protected(request).await,
        }
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, PagedashError> {
        self.execute(request).await?.json()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PagedashError> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, PagedashError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, PagedashError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::put(path).with_json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, PagedashError> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// Refresh the session now, sharing any refresh already in flight.
    ///
    /// Returns the new access token.
    pub async fn refresh_now(&self) -> Result<String, PagedashError> {
        let token = self.store.get_token().ok_or(AuthError::NotLoggedIn)?;
        match self.refresh.join() {
            RefreshTicket::Leader(leader) => self.lead_refresh(leader, &token).await,
            RefreshTicket::Waiter(waiter) => waiter.wait(self.config.refresh_wait_timeout).await,
        }
    }

    async fn execute_protected(&self, request: ApiRequest) -> Result<ApiResponse, PagedashError> {
        let sent_token = self.store.get_token();
        let outbound = match sent_token.as_deref() {
            Some(token) => request.authorized(token)?,
            None => {
                tracing::debug!(path = request.path(), "no token for protected request");
                self.redirect_to_login();
                request.clone()
            }
        };
        let response = self.transport.send(&outbound).await?;
        if !response.is_unauthorized() {
            return response.into_result();
        }
        match sent_token {
            Some(token) => self.recover(&request, &token).await,
            // Nothing to refresh.
            None => response.into_result(),
        }
    }

    /// 401 on a protected request that carried `sent_token`.
    async fn recover(&self, request: &ApiRequest, sent_token: &str) -> Result<ApiResponse, PagedashError> {
        let token = match self.refresh.join() {
            RefreshTicket::Leader(leader) => match self.store.get_token() {
                // A refresh completed while this request was in flight.
                Some(current) if current != sent_token => {
                    tracing::debug!(path = request.path(), "replaying with already refreshed token");
                    leader.resolve(RefreshOutcome::Refreshed(current.clone()));
                    current
                }
                Some(_) => self.lead_refresh(leader, sent_token).await?,
                None => {
                    let reason = "session ended while the request was in flight".to_string();
                    leader.resolve(RefreshOutcome::Failed(reason.clone()));
                    return Err(PagedashError::SessionExpired(reason));
                }
            },
            RefreshTicket::Waiter(waiter) => waiter.wait(self.config.refresh_wait_timeout).await?,
        };
        self.replay(request, &token).await
    }

    /// Perform the refresh as leader and broadcast its outcome.
    async fn lead_refresh(&self, leader: RefreshLeader<'_>, expiring_token: &str) -> Result<String, PagedashError> {
        match self.request_refresh(expiring_token).await {
            Ok(session) => {
                match session.identity() {
                    Some(identity) => self.store.set_credential(&session.token, &identity),
                    None => self.store.replace_token(&session.token),
                }
                leader.resolve(RefreshOutcome::Refreshed(session.token.clone()));
                tracing::debug!("token refreshed");
                Ok(session.token)
            }
            Err(err) => {
                let reason = err.to_string();
                leader.resolve(RefreshOutcome::Failed(reason.clone()));
                self.end_session();
                Err(PagedashError::SessionExpired(reason))
            }
        }
    }

    async fn request_refresh(&self, expiring_token: &str) -> Result<SessionData, PagedashError> {
        let request = ApiRequest::post(self.config.routes.refresh_path.as_str())
            .with_body(json!({}))
            .authorized(expiring_token)?;
        let response = self.transport.send(&request).await?.into_result()?;
        let envelope: Envelope<SessionData> = response.json()?;
        if envelope.data.token.trim().is_empty() {
            return Err(AuthError::RefreshRejected("refresh returned an empty token".into()).into());
        }
        Ok(envelope.data)
    }

    /// Re-issue the original request with `token`. A second 401 is returned as-is.
    async fn replay(&self, request: &ApiRequest, token: &str) -> Result<ApiResponse, PagedashError> {
        let outbound = request.authorized(token)?;
        self.transport.send(&outbound).await?.into_result()
    }

    /// A caller-issued call to the refresh endpoint, sent as given (the caller
    /// attaches the expiring token). Its 401 is terminal.
    async fn execute_refresh_route(&self, request: ApiRequest) -> Result<ApiResponse, PagedashError> {
        let response = self.transport.send(&request).await?;
        if response.is_unauthorized() {
            self.end_session();
        }
        response.into_result()
    }

    fn end_session(&self) {
        tracing::info!("session ended, clearing credentials");
        self.store.clear();
        self.redirect_to_login();
    }

    fn redirect_to_login(&self) {
        let current = self.navigator.current_url();
        if is_login_url(&current, &self.config.login_route) {
            return;
        }
        self.navigator.redirect_to_login(LoginRedirect {
            login_route: self.config.login_route.clone(),
            return_url: current,
        });
    }
}
