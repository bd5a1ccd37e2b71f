//! Page analytics (`/api/Facebook/analytics`) and the chart series built from it.

use std::collections::BTreeSet;
use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::segment;
use crate::error::PagedashError;
use crate::http::ApiRequest;
use crate::models::Envelope;
use crate::pipeline::ApiClient;

const ANALYTICS_PATH: &str = "/api/Facebook/analytics";
const MAX_SYNC_LOGS: u32 = 100;
const FALLBACK_COLOR: &str = "#3d79ee";

/// Known page metrics: key, display label, line color.
pub const METRIC_CATALOG: &[(&str, &str, &str)] = &[
    ("page_fans", "Fans", "#3d79ee"),
    ("page_followers", "Seguidores", "#10b981"),
    ("page_reach", "Alcance", "#f59e0b"),
    ("page_impressions", "Impresiones", "#ef4444"),
    ("page_engaged_users", "Usuarios que interactuaron", "#8b5cf6"),
    ("page_post_engagements", "Engagement total", "#ec4899"),
];

/// Metrics charted when the caller picks none.
pub const DEFAULT_METRICS: &[&str] = &["page_fans", "page_reach", "page_impressions"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Pages to sync; all pages when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub sync_run_id: String,
    pub pages_ok: u32,
    pub pages_failed: u32,
    #[serde(default)]
    pub message: String,
    #[serde(with = "super::timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub id: i64,
    pub facebook_page_id: String,
    pub name: String,
    #[serde(default)]
    pub picture_url: Option<String>,
    pub fan_count: i64,
    pub followers_count: i64,
    #[serde(with = "super::timestamp")]
    pub snapshot_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDailyValue {
    #[serde(with = "super::day")]
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetric {
    pub metric_key: String,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub daily_values: Vec<MetricDailyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub facebook_page_id: String,
    #[serde(default)]
    pub page_name: String,
    #[serde(with = "super::day")]
    pub from_date: NaiveDate,
    #[serde(with = "super::day")]
    pub to_date: NaiveDate,
    #[serde(default)]
    pub metrics: Vec<PageMetric>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub total: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

/// One line of a chart. `values` is aligned with the chart labels; `None` is a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub metric_key: String,
    pub label: String,
    pub values: Vec<Option<f64>>,
    pub color: String,
    #[serde(default)]
    pub statistics: SeriesStatistics,
}

/// Server-side chart (`/pages/{id}/chart`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageChart {
    pub facebook_page_id: String,
    #[serde(default)]
    pub page_name: String,
    #[serde(with = "super::day")]
    pub from_date: NaiveDate,
    #[serde(with = "super::day")]
    pub to_date: NaiveDate,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLog {
    pub id: i64,
    pub sync_run_id: String,
    pub user_id: i64,
    #[serde(with = "super::timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "super::timestamp::option")]
    pub ended_at: Option<DateTime<Utc>>,
    pub pages_ok: u32,
    pub pages_failed: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    pub status: SyncStatus,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

/// Chart built on the client from daily metric values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartData {
    /// One `d/m` label per distinct date, ascending.
    pub labels: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    /// Align every metric on the union of their dates.
    ///
    /// Dates a metric has no value for become `None`. Known metrics get their
    /// catalog label and color; unknown ones keep their key as label.
    pub fn from_metrics(metrics: &[PageMetric]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }
        let dates: Vec<NaiveDate> = metrics
            .iter()
            .flat_map(|m| m.daily_values.iter().map(|v| v.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let labels = dates
            .iter()
            .map(|d| format!("{}/{}", d.day(), d.month()))
            .collect();
        let series = metrics
            .iter()
            .map(|metric| {
                let (label, color) = metric_style(&metric.metric_key);
                let values = dates
                    .iter()
                    .map(|date| {
                        metric
                            .daily_values
                            .iter()
                            .find(|v| v.date == *date)
                            .map(|v| v.value)
                    })
                    .collect();
                ChartSeries {
                    metric_key: metric.metric_key.clone(),
                    label,
                    values,
                    color,
                    statistics: SeriesStatistics {
                        total: metric.total,
                        average: metric.average,
                        max: metric.max,
                        min: metric.min,
                    },
                }
            })
            .collect();
        Self {
            labels,
            dates,
            series,
        }
    }
}

/// Display label and color for a metric key.
pub fn metric_style(key: &str) -> (String, String) {
    METRIC_CATALOG
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, label, color)| (label.to_string(), color.to_string()))
        .unwrap_or_else(|| (key.to_string(), FALLBACK_COLOR.to_string()))
}

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    client: Arc<ApiClient>,
}

impl AnalyticsService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Pull fresh metrics from Facebook into the dashboard.
    pub async fn sync(&self, request: &SyncRequest) -> Result<SyncSummary, PagedashError> {
        let path = format!("{ANALYTICS_PATH}/sync");
        let envelope: Envelope<SyncSummary> = self.client.post_json(&path, request).await?;
        tracing::debug!(
            run = %envelope.data.sync_run_id,
            ok = envelope.data.pages_ok,
            failed = envelope.data.pages_failed,
            "analytics sync finished"
        );
        Ok(envelope.data)
    }

    pub async fn snapshot(&self, page_id: &str) -> Result<PageSnapshot, PagedashError> {
        let path = format!("{ANALYTICS_PATH}/pages/{}/snapshot", segment(page_id));
        let envelope: Envelope<PageSnapshot> = self.client.get_json(&path).await?;
        Ok(envelope.data)
    }

    /// Daily metrics in `[from, to]`. An empty `metric_keys` asks for all of them.
    pub async fn metrics(
        &self,
        page_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        metric_keys: &[&str],
    ) -> Result<PageMetrics, PagedashError> {
        let request = range_request(page_id, "metrics", from, to, metric_keys)?;
        let envelope: Envelope<PageMetrics> = self.client.send_json(request).await?;
        Ok(envelope.data)
    }

    /// Chart-ready metrics computed by the server.
    pub async fn chart(
        &self,
        page_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        metric_keys: &[&str],
    ) -> Result<PageChart, PagedashError> {
        let request = range_request(page_id, "chart", from, to, metric_keys)?;
        let envelope: Envelope<PageChart> = self.client.send_json(request).await?;
        Ok(envelope.data)
    }

    /// Most recent sync runs. `limit` is clamped to `1..=100`.
    pub async fn sync_logs(&self, limit: u32) -> Result<Vec<SyncLog>, PagedashError> {
        let request = ApiRequest::get(format!("{ANALYTICS_PATH}/sync-logs"))
            .with_query("limit", limit.clamp(1, MAX_SYNC_LOGS));
        let envelope: Envelope<Vec<SyncLog>> = self.client.send_json(request).await?;
        Ok(envelope.data)
    }
}

fn range_request(
    page_id: &str,
    resource: &str,
    from: NaiveDate,
    to: NaiveDate,
    metric_keys: &[&str],
) -> Result<ApiRequest, PagedashError> {
    if from > to {
        return Err(PagedashError::InvalidArgument(format!(
            "date range starts after it ends ({from} > {to})"
        )));
    }
    let keys = (!metric_keys.is_empty()).then(|| metric_keys.join(","));
    Ok(
        ApiRequest::get(format!("{ANALYTICS_PATH}/pages/{}/{resource}", segment(page_id)))
            .with_query("fromDate", from.format("%Y-%m-%d"))
            .with_query("toDate", to.format("%Y-%m-%d"))
            .with_optional_query("metricKeys", keys),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn metric(key: &str, values: &[(u32, f64)]) -> PageMetric {
        PageMetric {
            metric_key: key.to_string(),
            total: values.iter().map(|(_, v)| v).sum(),
            average: 0.0,
            max: 0.0,
            min: 0.0,
            daily_values: values
                .iter()
                .map(|&(d, value)| MetricDailyValue { date: day(d), value })
                .collect(),
        }
    }

    #[test]
    fn series_align_on_the_union_of_dates() {
        let chart = ChartData::from_metrics(&[
            metric("page_fans", &[(3, 120.0), (1, 100.0)]),
            metric("page_reach", &[(2, 40.0), (3, 55.0)]),
        ]);

        assert_eq!(chart.labels, vec!["1/3", "2/3", "3/3"]);
        assert_eq!(chart.series[0].values, vec![Some(100.0), None, Some(120.0)]);
        assert_eq!(chart.series[1].values, vec![None, Some(40.0), Some(55.0)]);
        assert_eq!(chart.series[0].label, "Fans");
        assert_eq!(chart.series[1].color, "#f59e0b");
        assert_eq!(chart.series[0].statistics.total, 220.0);
    }

    #[test]
    fn unknown_metric_keeps_its_key_and_default_color() {
        let chart = ChartData::from_metrics(&[metric("page_video_views", &[(1, 9.0)])]);
        assert_eq!(chart.series[0].label, "page_video_views");
        assert_eq!(chart.series[0].color, FALLBACK_COLOR);
    }

    #[test]
    fn no_metrics_means_an_empty_chart() {
        assert_eq!(ChartData::from_metrics(&[]), ChartData::default());
    }

    #[test]
    fn daily_values_accept_dates_with_a_time_part() {
        let value: MetricDailyValue =
            serde_json::from_str(r#"{"date":"2025-03-02T00:00:00","value":4}"#).unwrap();
        assert_eq!(value.date, day(2));
    }

    #[test]
    fn reversed_range_is_rejected_before_sending() {
        let err = range_request("p1", "metrics", day(5), day(1), &[]).unwrap_err();
        assert!(matches!(err, PagedashError::InvalidArgument(_)));
    }

    #[test]
    fn default_selection_is_in_the_catalog() {
        for key in DEFAULT_METRICS {
            assert!(METRIC_CATALOG.iter().any(|(k, _, _)| k == key));
        }
    }
}
