use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal signed-in user record, persisted next to the token.
///
/// Only `email` is required when reading it back; everything else defaults
/// so records written by older versions still load.
///
/// # Example
/// ```
/// use pagedash::auth::Identity;
///
/// let identity = Identity::new(7, "ana@example.com", "Admin", "Ana Pérez");
/// assert_eq!(identity.email, "ana@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "idUsuario", default)]
    pub user_id: i64,
    pub email: String,
    #[serde(rename = "rol", default)]
    pub role: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    #[serde(rename = "dateBird", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Identity {
    pub fn new(
        user_id: i64,
        email: impl Into<String>,
        role: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            email: email.into(),
            role: role.into(),
            full_name: full_name.into(),
            first_name: None,
            last_name: None,
            telephone: None,
            birth_date: None,
            is_active: None,
            avatar_url: None,
        }
    }

    /// An identity is usable only if it carries an email.
    pub fn is_well_formed(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

/// Access token plus the identity it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub identity: Identity,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, identity: Identity) -> Self {
        Self {
            access_token: access_token.into(),
            identity,
        }
    }

    /// Expiry from the token's `exp` claim, if it is a readable JWT.
    ///
    /// Informational only: the server stays the authority on validity.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        jwt_expiry(&self.access_token)
    }
}

/// Read the `exp` claim of a JWT without verifying it.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}
