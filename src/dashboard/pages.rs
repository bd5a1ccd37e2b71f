//! Connected Facebook pages (`/api/Facebook`).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PagedashError;
use crate::models::{Envelope, PageMeta};
use crate::pipeline::ApiClient;

const CONNECT_PATH: &str = "/api/Facebook/connect";
const PAGES_PATH: &str = "/api/Facebook/pages";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacebookPage {
    pub facebook_page_id: String,
    pub name: String,
    #[serde(default)]
    pub picture_url: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub can_publish: bool,
    #[serde(default)]
    pub can_only_analyze: bool,
    #[serde(default)]
    pub token_status: i32,
    #[serde(default, with = "super::timestamp::option")]
    pub last_validated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectLink {
    authorization_url: String,
}

#[derive(Debug, Clone)]
pub struct PagesService {
    client: Arc<ApiClient>,
}

impl PagesService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// URL of the Facebook consent screen that links new pages.
    pub async fn connect_url(&self) -> Result<String, PagedashError> {
        let envelope: Envelope<ConnectLink> = self.client.get_json(CONNECT_PATH).await?;
        Ok(envelope.data.authorization_url)
    }

    pub async fn list(&self) -> Result<Vec<FacebookPage>, PagedashError> {
        Ok(self.list_with_meta().await?.0)
    }

    pub async fn list_with_meta(&self) -> Result<(Vec<FacebookPage>, Option<PageMeta>), PagedashError> {
        let envelope: Envelope<Vec<FacebookPage>> = self.client.get_json(PAGES_PATH).await?;
        Ok((envelope.data, envelope.meta))
    }
}
