//! Convenience re-exports for common use.

pub use crate::auth::{AuthService, Credential, CredentialStore, Identity};
pub use crate::config::{ClientConfig, PathMatch};
pub use crate::dashboard::{
    AnalyticsService, MessagingService, PagesService, PostPlanService, ScheduledPostService,
    SettingsService,
};
pub use crate::error::{PagedashError, Result};
pub use crate::guard::AuthGuard;
pub use crate::http::{ApiRequest, ApiResponse, Transport};
pub use crate::models::{LoginRequest, RegisterRequest, UpdateProfileRequest};
pub use crate::navigation::{Navigator, RouterState};
pub use crate::pipeline::ApiClient;
