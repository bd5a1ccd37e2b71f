//! Calendar entries built from scheduled posts and post plans.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::scheduler::{PostPlanListItem, PostPlanStatus, ScheduledPost, ScheduledPostStatus, SocialNetwork};

const PREVIEW_CHARS: usize = 50;
const WHITE: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(with = "super::timestamp")]
    pub start: DateTime<Utc>,
    pub all_day: bool,
    pub background_color: String,
    pub border_color: String,
    pub text_color: String,
    pub status: ScheduledPostStatus,
    /// Set for events that come from a post plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<i64>,
}

impl From<&ScheduledPost> for CalendarEvent {
    fn from(post: &ScheduledPost) -> Self {
        let color = network_color(post.social_network);
        Self {
            id: post.id.clone(),
            title: format!("{} - {}", post.account_name, preview(&post.content)),
            start: post.scheduled_date,
            all_day: false,
            background_color: color.to_string(),
            border_color: color.to_string(),
            text_color: WHITE.to_string(),
            status: post.status,
            plan_id: post.plan_id,
        }
    }
}

impl From<&PostPlanListItem> for CalendarEvent {
    fn from(plan: &PostPlanListItem) -> Self {
        let mut title = plan.title.clone();
        if plan.has_link {
            title = format!("🔗 {title}");
        }
        if plan.has_image {
            title = format!("🖼️ {title}");
        }
        let summary = &plan.targets_summary;
        let (background, border) = plan_colors(plan.status);
        Self {
            id: format!("plan-{}", plan.id),
            title: format!("{title} ({}/{})", summary.published, summary.total),
            start: plan.scheduled_at,
            all_day: false,
            background_color: background.to_string(),
            border_color: border.to_string(),
            text_color: WHITE.to_string(),
            status: match plan.status {
                PostPlanStatus::Published => ScheduledPostStatus::Published,
                PostPlanStatus::Failed => ScheduledPostStatus::Failed,
                _ => ScheduledPostStatus::Scheduled,
            },
            plan_id: Some(plan.id),
        }
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

fn network_color(network: SocialNetwork) -> &'static str {
    match network {
        SocialNetwork::Facebook => "#1877f2",
        SocialNetwork::Instagram => "#e4405f",
        SocialNetwork::Twitter => "#1da1f2",
        SocialNetwork::Other => "#6b7280",
    }
}

fn plan_colors(status: PostPlanStatus) -> (&'static str, &'static str) {
    match status {
        PostPlanStatus::Pending => ("#fbbf24", "#f59e0b"),
        PostPlanStatus::Published => ("#10b981", "#059669"),
        PostPlanStatus::Failed => ("#ef4444", "#dc2626"),
        PostPlanStatus::Partial => ("#f59e0b", "#d97706"),
        PostPlanStatus::Canceled => ("#6b7280", "#4b5563"),
    }
}
