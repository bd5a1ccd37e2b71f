//! Typed services for the dashboard's feature endpoints.
//!
//! Each service is a thin wrapper over a shared [`ApiClient`](crate::pipeline::ApiClient),
//! so every call gets token attachment and refresh handling from the pipeline.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use pagedash::config::ClientConfig;
//! use pagedash::dashboard::{AnalyticsService, ChartData};
//! use pagedash::pipeline::ApiClient;
//!
//! # async fn example() -> pagedash::error::Result<()> {
//! let client = Arc::new(ApiClient::from_config(ClientConfig::from_env()?)?);
//! let analytics = AnalyticsService::new(client);
//! let from = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
//! let to = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
//! let report = analytics.metrics("1234567890", from, to, &[]).await?;
//! let chart = ChartData::from_metrics(&report.metrics);
//! println!("{} points", chart.labels.len());
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod calendar;
pub mod messaging;
pub mod pages;
pub mod scheduler;
pub mod settings;

pub use analytics::{
    AnalyticsService, ChartData, ChartSeries, MetricDailyValue, PageChart, PageMetric, PageMetrics,
    PageSnapshot, SyncLog, SyncRequest, SyncStatus, SyncSummary,
};
pub use calendar::CalendarEvent;
pub use messaging::{
    Conversation, ConversationPage, ConversationQuery, Message, MessagingService, MessagingSync,
};
pub use pages::{FacebookPage, PagesService};
pub use scheduler::{
    CreatePostPlanRequest, CreatedPostPlan, PostPlanDetails, PostPlanListItem, PostPlanQuery,
    PostPlanService, PostPlanStatus, PostTarget, PostTargetStatus, ScheduledPost,
    ScheduledPostRequest, ScheduledPostService, ScheduledPostStatus, SocialNetwork, TargetsSummary,
};
pub use settings::{SettingsService, UpdateUserSettings, UserSettings};

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}

/// Server timestamps: RFC 3339, or a naive ISO 8601 date-time read as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.is_empty() => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp: {raw}"))
                }),
                _ => Ok(None),
            }
        }
    }
}

/// Calendar days: `YYYY-MM-DD`, ignoring any time part the server appends.
pub(crate) mod day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let date = raw.split('T').next().unwrap_or_default();
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| serde::de::Error::custom(format!("invalid date: {raw}")))
    }
}
