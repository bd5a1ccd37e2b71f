//! Wire types for the account endpoints (`/api/Token`, `/api/Account`, `/api/me`).

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::auth::Identity;

/// Standard response envelope: `{ "data": ..., "meta": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// Pagination metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMeta {
    pub total_count: u64,
    pub page_size: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    // The API spells it "Previus".
    #[serde(rename = "hasPreviusPage")]
    pub has_previous_page: bool,
    pub next_page_url: Option<String>,
    #[serde(rename = "previusPageUrl")]
    pub previous_page_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Token plus identity, as returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub token: String,
    #[serde(rename = "idUsuario", default)]
    pub user_id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "rol", default)]
    pub role: String,
    #[serde(default)]
    pub full_name: String,
}

impl SessionData {
    /// Identity carried by the response, if it has one.
    pub fn identity(&self) -> Option<Identity> {
        let identity = Identity::new(
            self.user_id,
            self.email.clone(),
            self.role.clone(),
            self.full_name.clone(),
        );
        identity.is_well_formed().then_some(identity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub telephone: String,
    #[serde(rename = "rol")]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    #[serde(rename = "idUsuario")]
    pub user_id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(rename = "rol")]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

impl ChangePasswordRequest {
    pub fn new(current: impl Into<String>, new_password: impl Into<String>) -> Self {
        let new_password = new_password.into();
        Self {
            current_password: current.into(),
            confirm_new_password: new_password.clone(),
            new_password,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
    /// `YYYY-MM-DD`
    #[serde(rename = "dateBird")]
    pub birth_date: String,
}

/// Full profile returned by `PUT /api/me`. Same shape as a stored [`Identity`].
pub type ProfileData = Identity;
