//! Schoology client against a mock server.

use chrono::NaiveDate;
use scal_core::config::ScalConfig;
use scal_core::error::ScalError;
use scal_core::upstream::Upstream;
use scal_schoology::SchoologyClient;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header_exists, method, path, query_param},
};

fn config_for(base_url: &str) -> ScalConfig {
    let mut config = ScalConfig::default();
    config.schoology.base_url = base_url.to_string();
    config.schoology.key = Some("key".into());
    config.schoology.secret = Some("secret".into());
    config.schoology.user_id = Some("42".into());
    config.schoology.timeout_secs = 5;
    config
}

fn create_test_client(mock_server: &MockServer) -> SchoologyClient {
    SchoologyClient::new(&config_for(&mock_server.uri())).expect("Failed to create client")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

// ============================================================================
// REST endpoints
// ============================================================================

#[tokio::test]
async fn test_sections_are_signed_and_parsed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/42/sections"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "section": [
                {"id": "55", "course_title": "Chemistry", "section_title": "P2"},
                {"id": 56, "course_title": "Biology", "section_title": ""}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sections = create_test_client(&mock_server).sections().await.unwrap();

    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].display_name(), "Chemistry - P2");
    assert_eq!(sections[1].id, "56");
    assert_eq!(sections[1].display_name(), "Biology");
}

#[tokio::test]
async fn test_events_follow_pages_until_short_page() {
    let mock_server = MockServer::start().await;

    let full_page: Vec<_> = (0..500)
        .map(|i| json!({"id": i, "type": "assignment", "assignment_id": 10_000 + i, "section_id": "55"}))
        .collect();
    let last_page: Vec<_> = (500..503)
        .map(|i| json!({"id": i, "type": "event", "realm_id": "55"}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/users/42/events"))
        .and(query_param("start", "0"))
        .and(query_param("limit", "500"))
        .and(query_param("start_date", "2025-03-01"))
        .and(query_param("end_date", "2025-03-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event": full_page })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/42/events"))
        .and(query_param("start", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": last_page })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let events = create_test_client(&mock_server)
        .events(day(1), day(31))
        .await
        .unwrap();

    assert_eq!(events.len(), 503);
    assert_eq!(events[0].assignment_key(), "10000");
    assert_eq!(events[502].realm_id.as_deref(), Some("55"));
}

#[tokio::test]
async fn test_unreadable_row_does_not_end_paging() {
    let mock_server = MockServer::start().await;

    let mut full_page: Vec<_> = (0..499)
        .map(|i| json!({"id": i, "type": "assignment", "assignment_id": 10_000 + i}))
        .collect();
    full_page.push(json!({"type": "assignment", "title": "no id"}));

    Mock::given(method("GET"))
        .and(path("/users/42/events"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event": full_page })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/42/events"))
        .and(query_param("start", "500"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "event": [{"id": 900, "type": "event"}] })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let events = create_test_client(&mock_server)
        .events(day(1), day(31))
        .await
        .unwrap();

    assert_eq!(events.len(), 500, "499 readable rows plus the second page");
    assert_eq!(events[499].id, "900");
}

#[tokio::test]
async fn test_non_200_is_an_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/42/sections"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let err = create_test_client(&mock_server).sections().await.unwrap_err();

    match err {
        ScalError::Upstream { status, path } => {
            assert_eq!(status, 401);
            assert_eq!(path, "/users/42/sections");
        }
        other => panic!("Expected Upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_submission_states() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sections/55/submissions/7001/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "revision": [{"revision_id": 1, "draft": 0}],
            "allow_submissions": 1
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sections/55/submissions/7002/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sections/55/submissions/7003/42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    let submitted = client.submission("55", "7001").await.unwrap();
    assert!(submitted.has_submission);
    assert!(!submitted.submissions_disabled);

    let missing = client.submission("55", "7002").await.unwrap();
    assert!(!missing.has_submission);
    assert!(missing.submissions_disabled, "404 means the dropbox is off");

    let err = client.submission("55", "7003").await.unwrap_err();
    assert!(matches!(err, ScalError::Upstream { status: 500, .. }), "Got {err:?}");
}

#[tokio::test]
async fn test_missing_credentials_fail_before_any_request() {
    let mock_server = MockServer::start().await;
    let mut config = config_for(&mock_server.uri());
    config.schoology.secret = None;

    let client = SchoologyClient::new(&config).unwrap();
    let err = client.sections().await.unwrap_err();

    assert!(matches!(err, ScalError::MissingCredentials(_)), "Got {err:?}");
    assert!(mock_server.received_requests().await.unwrap_or_default().is_empty());
}

// ============================================================================
// ICS export
// ============================================================================

#[tokio::test]
async fn test_fetch_calendar_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar/feed/ical/1/x.ics"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/calendar/feed/ical/1/x.ics", mock_server.uri());
    let body = create_test_client(&mock_server)
        .fetch_calendar(&url)
        .await
        .unwrap();

    assert!(body.starts_with("BEGIN:VCALENDAR"));
}

#[tokio::test]
async fn test_fetch_calendar_rejects_empty_and_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/empty.ics"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \r\n"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone.ics"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);

    for name in ["empty.ics", "gone.ics"] {
        let url = format!("{}/{name}", mock_server.uri());
        let err = client.fetch_calendar(&url).await.unwrap_err();
        assert!(matches!(err, ScalError::FeedUnavailable(_)), "{name}: {err:?}");
    }
}

#[tokio::test]
async fn test_unreachable_host_is_offline() {
    // Nothing listens on port 9 on loopback.
    let client = SchoologyClient::new(&config_for("http://127.0.0.1:9")).unwrap();

    let err = client.sections().await.unwrap_err();
    assert!(err.is_offline(), "Got {err:?}");
    assert_eq!(err.to_string(), "no wifi");
}
