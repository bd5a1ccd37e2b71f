//! Dashboard services over real HTTP against a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pagedash::auth::{CredentialStore, Identity};
use pagedash::config::ClientConfig;
use pagedash::dashboard::{
    AnalyticsService, ChartData, ConversationQuery, CreatePostPlanRequest, MessagingService,
    PagesService, PostPlanQuery, PostPlanService, PostPlanStatus, PostTargetStatus,
    ScheduledPostService, SettingsService, SocialNetwork, UpdateUserSettings,
};
use pagedash::error::PagedashError;
use pagedash::http::ReqwestTransport;
use pagedash::navigation::RouterState;
use pagedash::pipeline::ApiClient;

const PAGE: &str = "1234567890";

fn client_for(server: &MockServer, token: &str) -> Arc<ApiClient> {
    let config = ClientConfig::new(server.uri()).with_request_timeout(Duration::from_secs(5));
    let transport = Arc::new(ReqwestTransport::new(config.clone()).expect("transport"));
    let store = Arc::new(CredentialStore::in_memory());
    store.set_credential(token, &Identity::new(7, "ana@example.com", "Admin", "Ana Ruiz"));
    Arc::new(ApiClient::new(
        config,
        transport,
        store,
        Arc::new(RouterState::new("/dashboard")),
    ))
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).expect("date")
}

#[tokio::test]
async fn metrics_feed_the_client_side_chart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/Facebook/analytics/pages/{PAGE}/metrics")))
        .and(header("authorization", "Bearer tok"))
        .and(query_param("fromDate", "2025-03-01"))
        .and(query_param("toDate", "2025-03-03"))
        .and(query_param("metricKeys", "page_fans,page_reach"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "facebookPageId": PAGE,
                "pageName": "Cafe Central",
                "fromDate": "2025-03-01",
                "toDate": "2025-03-03",
                "metrics": [
                    {
                        "metricKey": "page_fans",
                        "total": 330, "average": 110, "max": 120, "min": 100,
                        "dailyValues": [
                            { "date": "2025-03-01", "value": 100 },
                            { "date": "2025-03-03", "value": 120 }
                        ]
                    },
                    {
                        "metricKey": "page_reach",
                        "total": 40, "average": 40, "max": 40, "min": 40,
                        "dailyValues": [{ "date": "2025-03-02T00:00:00", "value": 40 }]
                    }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let analytics = AnalyticsService::new(client_for(&server, "tok"));
    let report = analytics
        .metrics(PAGE, march(1), march(3), &["page_fans", "page_reach"])
        .await
        .expect("metrics");
    let chart = ChartData::from_metrics(&report.metrics);

    assert_eq!(report.page_name, "Cafe Central");
    assert_eq!(chart.labels, vec!["1/3", "2/3", "3/3"]);
    assert_eq!(chart.series[0].values, vec![Some(100.0), None, Some(120.0)]);
    assert_eq!(chart.series[1].values, vec![None, Some(40.0), None]);
    assert_eq!(chart.series[1].label, "Alcance");
}

#[tokio::test]
async fn sync_log_limit_is_clamped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Facebook/analytics/sync-logs"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 1,
                "syncRunId": "run-1",
                "userId": 7,
                "startedAt": "2025-03-01T10:00:00Z",
                "endedAt": null,
                "pagesOk": 2,
                "pagesFailed": 0,
                "lastError": null,
                "status": "Running",
                "durationSeconds": null
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let analytics = AnalyticsService::new(client_for(&server, "tok"));
    let logs = analytics.sync_logs(500).await.expect("logs");

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].ended_at, None);
    assert_eq!(logs[0].status.to_string(), "Running");
}

#[tokio::test]
async fn expired_token_is_refreshed_under_a_service_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/Facebook/analytics/pages/{PAGE}/snapshot")))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/Facebook/analytics/pages/{PAGE}/snapshot")))
        .and(header("authorization", "Bearer new123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 3,
                "facebookPageId": PAGE,
                "name": "Cafe Central",
                "pictureUrl": null,
                "fanCount": 1520,
                "followersCount": 1611,
                "snapshotAt": "2025-03-04T08:00:00"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/Token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "token": "new123", "idUsuario": 7, "email": "ana@example.com", "rol": "Admin", "fullName": "Ana Ruiz" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "old");
    let snapshot = AnalyticsService::new(client.clone())
        .snapshot(PAGE)
        .await
        .expect("snapshot");

    assert_eq!(snapshot.fan_count, 1520);
    assert_eq!(snapshot.snapshot_at, Utc.with_ymd_and_hms(2025, 3, 4, 8, 0, 0).unwrap());
    assert_eq!(client.store().get_token().as_deref(), Some("new123"));
}

#[tokio::test]
async fn connected_pages_come_with_meta() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Facebook/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "facebookPageId": PAGE,
                "name": "Cafe Central",
                "pictureUrl": "https://cdn.example.com/p.png",
                "isActive": true,
                "tasks": ["CREATE_CONTENT", "ANALYZE"],
                "canPublish": true,
                "canOnlyAnalyze": false,
                "tokenStatus": 1,
                "lastValidatedAt": "2025-03-01T12:00:00Z"
            }],
            "meta": { "totalCount": 1, "pageSize": 10, "currentPage": 1, "totalPages": 1 }
        })))
        .mount(&server)
        .await;

    let (pages, meta) = PagesService::new(client_for(&server, "tok"))
        .list_with_meta()
        .await
        .expect("pages");

    assert_eq!(pages[0].tasks, vec!["CREATE_CONTENT", "ANALYZE"]);
    assert!(pages[0].can_publish);
    assert_eq!(meta.map(|m| m.total_count), Some(1));
}

#[tokio::test]
async fn conversations_send_only_the_filters_given() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/Facebook/messaging/pages/{PAGE}/conversations")))
        .and(query_param("limit", "20"))
        .and(query_param("isArchived", "false"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "conversations": [{
                    "id": 9,
                    "facebookPageId": PAGE,
                    "conversationId": "t_100",
                    "participantId": "u_1",
                    "participantName": "Luis Mora",
                    "participantPictureUrl": null,
                    "lastMessageAt": "2025-03-05T18:22:00Z",
                    "unreadCount": 2,
                    "lastMessagePreview": "¿Abren el domingo?",
                    "isArchived": false
                }],
                "totalCount": 31,
                "hasMore": true,
                "nextCursor": "c2"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messaging = MessagingService::new(client_for(&server, "tok"));
    let query = ConversationQuery::builder().limit(20).archived(false).build();
    let page = messaging.conversations(PAGE, &query).await.expect("conversations");

    assert_eq!(page.conversations[0].unread_count, 2);
    assert!(page.has_more);
    assert_eq!(page.next_cursor.as_deref(), Some("c2"));
}

#[tokio::test]
async fn reply_is_trimmed_and_blank_replies_never_leave() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/Facebook/messaging/pages/{PAGE}/conversations/t_100/send")))
        .and(body_json(json!({ "message": "Sí, de 9 a 14" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 55,
                "messageId": "m_55",
                "fromId": PAGE,
                "toId": "u_1",
                "message": "Sí, de 9 a 14",
                "createdTime": "2025-03-05T18:30:00Z",
                "isFromPage": true,
                "messageType": null,
                "isRead": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messaging = MessagingService::new(client_for(&server, "tok"));
    let sent = messaging
        .send(PAGE, "t_100", "  Sí, de 9 a 14 \n")
        .await
        .expect("send");
    let err = messaging.send(PAGE, "t_100", "   ").await.unwrap_err();

    assert!(sent.is_from_page);
    assert!(matches!(err, PagedashError::InvalidArgument(_)), "got {err:?}");
}

#[tokio::test]
async fn post_plan_is_created_and_listed_for_the_calendar() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/PostPlan"))
        .and(body_json(json!({
            "scheduledAt": "2025-03-11T14:00:00+00:00",
            "timezone": "America/Bogota",
            "message": "Lanzamiento de temporada",
            "pageIds": [PAGE]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "planId": 42, "targetsCreated": 1, "targetsSkipped": 0, "message": "Plan created" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/PostPlan"))
        .and(query_param("from", "2025-03-01"))
        .and(query_param("to", "2025-03-31"))
        .and(query_param("onlyWithPublishableTargets", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 42,
                "scheduledAt": "2025-03-11T14:00:00Z",
                "timezone": "America/Bogota",
                "createdAt": "2025-03-01T09:00:00Z",
                "title": "Lanzamiento de temporada",
                "status": "Published",
                "targetsSummary": { "total": 1, "pending": 0, "published": 1, "failed": 0, "skipped": 0 },
                "hasLink": false,
                "hasImage": false
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let plans = PostPlanService::new(client_for(&server, "tok"));
    let request = CreatePostPlanRequest::builder()
        .scheduled_at(Utc.with_ymd_and_hms(2025, 3, 11, 14, 0, 0).unwrap())
        .timezone("America/Bogota")
        .message("Lanzamiento de temporada")
        .page_ids(vec![PAGE.to_string()])
        .build();
    let created = plans.create(&request).await.expect("create");
    let events = plans
        .calendar(
            &PostPlanQuery::builder()
                .from(march(1))
                .to(march(31))
                .only_with_publishable_targets(true)
                .build(),
        )
        .await
        .expect("calendar");

    assert_eq!(created.plan_id, 42);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "plan-42");
    assert_eq!(events[0].title, "Lanzamiento de temporada (1/1)");
    assert_eq!(events[0].background_color, "#10b981");
}

#[tokio::test]
async fn plan_details_decode_numeric_target_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/PostPlan/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 42,
                "message": "Lanzamiento",
                "scheduledAt": "2025-03-11T14:00:00Z",
                "timezone": "America/Bogota",
                "createdAt": "2025-03-01T09:00:00Z",
                "targets": [
                    { "facebookPageId": PAGE, "name": "Cafe Central", "status": 1, "attemptCount": 1 },
                    { "facebookPageId": "999", "name": "Bar Sur", "status": 3, "attemptCount": 0,
                      "lastError": "page cannot publish" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let details = PostPlanService::new(client_for(&server, "tok"))
        .details(42)
        .await
        .expect("details");

    let statuses: Vec<PostTargetStatus> = details.targets.iter().map(|t| t.status).collect();
    assert_eq!(statuses, vec![PostTargetStatus::Published, PostTargetStatus::Skipped]);
    assert_eq!(details.targets[1].last_error.as_deref(), Some("page cannot publish"));
}

#[tokio::test]
async fn reversed_plan_window_is_rejected_locally() {
    let server = MockServer::start().await;
    let plans = PostPlanService::new(client_for(&server, "tok"));

    let err = plans
        .list(
            &PostPlanQuery::builder()
                .from(march(31))
                .to(march(1))
                .status(PostPlanStatus::Pending)
                .build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PagedashError::InvalidArgument(_)), "got {err:?}");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn scheduled_posts_map_to_calendar_events() {
    let server = MockServer::start().await;
    let long = "Esta semana tenemos promociones en todos los cafés de la casa y más";
    Mock::given(method("GET"))
        .and(path("/api/ScheduledPosts"))
        .and(query_param("start", "2025-03-01T00:00:00+00:00"))
        .and(query_param("end", "2025-04-01T00:00:00+00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "sp-1",
                "content": long,
                "scheduledDate": "2025-03-10T15:00:00Z",
                "socialNetwork": "facebook",
                "accountId": "acc-1",
                "accountName": "Cafe Central",
                "status": "scheduled"
            },
            {
                "id": "sp-2",
                "content": "Nuevo menú",
                "scheduledDate": "2025-03-12T15:00:00Z",
                "socialNetwork": "tiktok",
                "accountId": "acc-2",
                "accountName": "Bar Sur",
                "status": "published"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let scheduled = ScheduledPostService::new(client_for(&server, "tok"));
    let events = scheduled
        .calendar(
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
        )
        .await
        .expect("events");

    let expected_preview: String = long.chars().take(50).collect();
    assert_eq!(events[0].title, format!("Cafe Central - {expected_preview}..."));
    assert_eq!(events[0].background_color, "#1877f2");
    assert_eq!(events[1].title, "Bar Sur - Nuevo menú");
    assert_eq!(events[1].background_color, "#6b7280");
}

#[tokio::test]
async fn scheduled_post_create_requires_the_core_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ScheduledPosts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sp-9",
            "content": "Hola",
            "scheduledDate": "2025-03-10T15:00:00Z",
            "socialNetwork": "instagram",
            "accountId": "acc-1",
            "accountName": "Cafe Central",
            "status": "scheduled"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let scheduled = ScheduledPostService::new(client_for(&server, "tok"));
    let incomplete = pagedash::dashboard::ScheduledPostRequest::builder()
        .content("Hola".to_string())
        .build();
    let err = scheduled.create(&incomplete).await.unwrap_err();

    let complete = pagedash::dashboard::ScheduledPostRequest::builder()
        .content("Hola".to_string())
        .scheduled_date(Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap())
        .social_network(SocialNetwork::Instagram)
        .account_id("acc-1".to_string())
        .build();
    let post = scheduled.create(&complete).await.expect("create");

    assert!(matches!(err, PagedashError::InvalidArgument(ref m) if m.contains("scheduledDate")));
    assert_eq!(post.social_network, SocialNetwork::Instagram);
}

#[tokio::test]
async fn settings_update_sends_only_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/UserSettings"))
        .and(body_json(json!({ "theme": "dark", "firstDayOfWeek": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "language": "es",
                "timezone": "America/Bogota",
                "dateFormat": "dd/MM/yyyy",
                "firstDayOfWeek": 1,
                "theme": "dark"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = SettingsService::new(client_for(&server, "tok"));
    let changes = UpdateUserSettings::builder()
        .theme("dark".to_string())
        .first_day_of_week(1)
        .build();
    let stored = settings.update(&changes).await.expect("update");
    let err = settings
        .update(&UpdateUserSettings::builder().first_day_of_week(7).build())
        .await
        .unwrap_err();

    assert_eq!(stored.theme, "dark");
    assert_eq!(stored.first_day_of_week, 1);
    assert!(matches!(err, PagedashError::InvalidArgument(_)), "got {err:?}");
}
