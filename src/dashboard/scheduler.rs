//! Publishing: post plans (`/api/PostPlan`) and scheduled posts (`/api/ScheduledPosts`).

use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::calendar::CalendarEvent;
use super::segment;
use crate::error::PagedashError;
use crate::http::ApiRequest;
use crate::models::Envelope;
use crate::pipeline::ApiClient;

const POST_PLAN_PATH: &str = "/api/PostPlan";
const SCHEDULED_POSTS_PATH: &str = "/api/ScheduledPosts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum PostPlanStatus {
    Pending,
    Published,
    Failed,
    Partial,
    Canceled,
}

/// Per-page publishing state. Sent as a number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(try_from = "u8", into = "u8")]
pub enum PostTargetStatus {
    Pending,
    Published,
    Failed,
    Skipped,
}

impl TryFrom<u8> for PostTargetStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Published),
            2 => Ok(Self::Failed),
            3 => Ok(Self::Skipped),
            other => Err(format!("unknown post target status {other}")),
        }
    }
}

impl From<PostTargetStatus> for u8 {
    fn from(status: PostTargetStatus) -> Self {
        match status {
            PostTargetStatus::Pending => 0,
            PostTargetStatus::Published => 1,
            PostTargetStatus::Failed => 2,
            PostTargetStatus::Skipped => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct CreatePostPlanRequest {
    #[serde(with = "super::timestamp")]
    pub scheduled_at: DateTime<Utc>,
    /// IANA zone the plan was authored in, e.g. `America/Bogota`.
    pub timezone: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Target pages; every publishable page when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPostPlan {
    pub plan_id: i64,
    pub targets_created: u32,
    pub targets_skipped: u32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTarget {
    pub facebook_page_id: String,
    pub name: String,
    pub status: PostTargetStatus,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default, with = "super::timestamp::option")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPlanDetails {
    pub id: i64,
    pub message: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(with = "super::timestamp")]
    pub scheduled_at: DateTime<Utc>,
    pub timezone: String,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub targets: Vec<PostTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsSummary {
    pub total: u32,
    pub pending: u32,
    pub published: u32,
    pub failed: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPlanListItem {
    pub id: i64,
    #[serde(with = "super::timestamp")]
    pub scheduled_at: DateTime<Utc>,
    pub timezone: String,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub status: PostPlanStatus,
    #[serde(default)]
    pub targets_summary: TargetsSummary,
    #[serde(default)]
    pub has_link: bool,
    #[serde(default)]
    pub has_image: bool,
}

/// Calendar window for listing plans; both days inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct PostPlanQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub status: Option<PostPlanStatus>,
    pub only_with_publishable_targets: Option<bool>,
    /// Free-text search.
    pub q: Option<String>,
}

impl PostPlanQuery {
    fn to_request(&self) -> Result<ApiRequest, PagedashError> {
        if self.from > self.to {
            return Err(PagedashError::InvalidArgument(format!(
                "date range starts after it ends ({} > {})",
                self.from, self.to
            )));
        }
        Ok(ApiRequest::get(POST_PLAN_PATH)
            .with_query("from", self.from.format("%Y-%m-%d"))
            .with_query("to", self.to.format("%Y-%m-%d"))
            .with_optional_query("status", self.status)
            .with_optional_query("onlyWithPublishableTargets", self.only_with_publishable_targets)
            .with_optional_query("q", self.q.as_deref().filter(|q| !q.is_empty())))
    }
}

#[derive(Debug, Clone)]
pub struct PostPlanService {
    client: Arc<ApiClient>,
}

impl PostPlanService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Schedule one message for several pages.
    pub async fn create(&self, request: &CreatePostPlanRequest) -> Result<CreatedPostPlan, PagedashError> {
        if request.message.trim().is_empty() {
            return Err(PagedashError::InvalidArgument("plan message is empty".to_string()));
        }
        if request.timezone.trim().is_empty() {
            return Err(PagedashError::InvalidArgument("plan timezone is empty".to_string()));
        }
        let envelope: Envelope<CreatedPostPlan> = self.client.post_json(POST_PLAN_PATH, request).await?;
        tracing::info!(
            plan_id = envelope.data.plan_id,
            targets = envelope.data.targets_created,
            skipped = envelope.data.targets_skipped,
            "post plan created"
        );
        Ok(envelope.data)
    }

    pub async fn details(&self, plan_id: i64) -> Result<PostPlanDetails, PagedashError> {
        let envelope: Envelope<PostPlanDetails> =
            self.client.get_json(&format!("{POST_PLAN_PATH}/{plan_id}")).await?;
        Ok(envelope.data)
    }

    pub async fn list(&self, query: &PostPlanQuery) -> Result<Vec<PostPlanListItem>, PagedashError> {
        let envelope: Envelope<Vec<PostPlanListItem>> = self.client.send_json(query.to_request()?).await?;
        Ok(envelope.data)
    }

    pub async fn calendar(&self, query: &PostPlanQuery) -> Result<Vec<CalendarEvent>, PagedashError> {
        let plans = self.list(query).await?;
        Ok(plans.iter().map(CalendarEvent::from).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SocialNetwork {
    Facebook,
    Instagram,
    Twitter,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScheduledPostStatus {
    Scheduled,
    Published,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(with = "super::timestamp")]
    pub scheduled_date: DateTime<Utc>,
    pub social_network: SocialNetwork,
    pub account_id: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default)]
    pub page_name: Option<String>,
    #[serde(default)]
    pub plan_id: Option<i64>,
    pub status: ScheduledPostStatus,
    #[serde(default, with = "super::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "super::timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for creating (all required fields set) or updating a scheduled post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "super::timestamp::option"
    )]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_network: Option<SocialNetwork>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScheduledPostService {
    client: Arc<ApiClient>,
}

impl ScheduledPostService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Posts scheduled in `[start, end]`. This endpoint answers a bare array.
    pub async fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScheduledPost>, PagedashError> {
        let request = ApiRequest::get(SCHEDULED_POSTS_PATH)
            .with_query("start", start.to_rfc3339())
            .with_query("end", end.to_rfc3339());
        self.client.send_json(request).await
    }

    pub async fn calendar(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<CalendarEvent>, PagedashError> {
        let posts = self.range(start, end).await?;
        Ok(posts.iter().map(CalendarEvent::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<ScheduledPost, PagedashError> {
        self.client.get_json(&post_path(id)).await
    }

    pub async fn create(&self, request: &ScheduledPostRequest) -> Result<ScheduledPost, PagedashError> {
        let missing = [
            ("content", request.content.is_none()),
            ("scheduledDate", request.scheduled_date.is_none()),
            ("socialNetwork", request.social_network.is_none()),
            ("accountId", request.account_id.is_none()),
        ];
        if let Some((field, _)) = missing.iter().find(|(_, absent)| *absent) {
            return Err(PagedashError::InvalidArgument(format!("{field} is required")));
        }
        self.client.post_json(SCHEDULED_POSTS_PATH, request).await
    }

    /// Only the fields that are set are changed.
    pub async fn update(&self, id: &str, request: &ScheduledPostRequest) -> Result<ScheduledPost, PagedashError> {
        self.client.put_json(&post_path(id), request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), PagedashError> {
        self.client.delete(&post_path(id)).await?;
        Ok(())
    }
}

fn post_path(id: &str) -> String {
    format!("{SCHEDULED_POSTS_PATH}/{}", segment(id))
}
