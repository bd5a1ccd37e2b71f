use std::sync::Arc;

use super::credential::Identity;
use super::error::AuthError;
use crate::error::PagedashError;
use crate::models::{
    ChangePasswordRequest, Envelope, LoginRequest, ProfileData, RegisterRequest, RegisteredUser,
    SessionData, UpdateProfileRequest,
};
use crate::pipeline::ApiClient;

const CHANGE_PASSWORD_PATH: &str = "/api/Account/change-password";
const PROFILE_PATH: &str = "/api/me";

/// Account flows on top of the request pipeline.
///
/// Every call goes through [`ApiClient`], so profile and password calls get
/// the same token attachment and refresh handling as any other request.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use pagedash::auth::AuthService;
/// use pagedash::config::ClientConfig;
/// use pagedash::models::LoginRequest;
/// use pagedash::pipeline::ApiClient;
///
/// # async fn example() -> pagedash::error::Result<()> {
/// let client = Arc::new(ApiClient::from_config(ClientConfig::from_env()?)?);
/// let auth = AuthService::new(client);
/// let me = auth.login(&LoginRequest::new("ana@example.com", "s3cret!")).await?;
/// println!("signed in as {}", me.full_name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Sign in and persist the returned token and identity.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Identity, PagedashError> {
        let routes = &self.client.config().routes;
        let envelope: Envelope<SessionData> =
            self.client.post_json(&routes.login_path, credentials).await?;
        let session = envelope.data;
        let identity = session
            .identity()
            .ok_or_else(|| AuthError::InvalidResponse("login response has no email".into()))?;
        if session.token.trim().is_empty() {
            return Err(AuthError::InvalidResponse("login response has no token".into()).into());
        }
        self.client.store().set_credential(&session.token, &identity);
        tracing::info!(user_id = identity.user_id, "signed in");
        Ok(identity)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisteredUser, PagedashError> {
        let routes = &self.client.config().routes;
        let envelope: Envelope<RegisteredUser> =
            self.client.post_json(&routes.register_path, request).await?;
        Ok(envelope.data)
    }

    /// Renew the token now. Shares any refresh already in flight.
    pub async fn refresh(&self) -> Result<Identity, PagedashError> {
        self.client.refresh_now().await?;
        self.current_identity()
            .ok_or_else(|| AuthError::NotLoggedIn.into())
    }

    /// Returns the server's confirmation message.
    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<String, PagedashError> {
        if request.new_password != request.confirm_new_password {
            return Err(PagedashError::InvalidArgument(
                "new password and confirmation differ".to_string(),
            ));
        }
        let envelope: Envelope<String> = self.client.post_json(CHANGE_PASSWORD_PATH, request).await?;
        Ok(envelope.data)
    }

    /// Update the profile and the stored identity.
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<ProfileData, PagedashError> {
        let envelope: Envelope<ProfileData> = self.client.put_json(PROFILE_PATH, request).await?;
        self.client.store().update_identity(&envelope.data);
        Ok(envelope.data)
    }

    pub fn logout(&self) {
        self.client.store().clear();
        tracing::info!("signed out");
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.client.store().get_identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.store().is_authenticated()
    }
}
