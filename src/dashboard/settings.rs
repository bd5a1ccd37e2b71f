//! Per-user display preferences (`/api/UserSettings`).

use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::PagedashError;
use crate::models::Envelope;
use crate::pipeline::ApiClient;

const SETTINGS_PATH: &str = "/api/UserSettings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub language: String,
    pub timezone: String,
    pub date_format: String,
    /// 0 is Sunday.
    pub first_day_of_week: u8,
    pub theme: String,
}

/// Partial update; unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_day_of_week: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SettingsService {
    client: Arc<ApiClient>,
}

impl SettingsService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> Result<UserSettings, PagedashError> {
        let envelope: Envelope<UserSettings> = self.client.get_json(SETTINGS_PATH).await?;
        Ok(envelope.data)
    }

    /// Returns the settings as stored after the update.
    pub async fn update(&self, changes: &UpdateUserSettings) -> Result<UserSettings, PagedashError> {
        if changes.first_day_of_week.is_some_and(|day| day > 6) {
            return Err(PagedashError::InvalidArgument(
                "first day of week must be between 0 and 6".to_string(),
            ));
        }
        let envelope: Envelope<UserSettings> = self.client.put_json(SETTINGS_PATH, changes).await?;
        Ok(envelope.data)
    }
}
