use std::time::Duration;

use eventcache_core::api::{ApiClient, EventListParams, EventTransport, TransportErrorKind};
use eventcache_core::models::EventDraft;
use httpmock::prelude::*;
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn hike() -> serde_json::Value {
    json!({
        "id": "e1",
        "title": "Mountain hike",
        "description": "Up and down",
        "date": "2024-03-05",
        "time": "18:30",
        "location": "Trailhead",
        "image": "images/hike.jpg"
    })
}

#[tokio::test]
async fn fetch_events_sends_filters() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/events")
                .query_param("search", "hike")
                .query_param("max", "3");
            then.status(200).json_body(json!({ "events": [hike()] }));
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let params = EventListParams {
        search_term: Some("hike".to_string()),
        max: Some(3),
    };
    let events = client
        .fetch_events(params, CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Mountain hike");
    assert_eq!(events[0].formatted_datetime(), "Mar 5, 2024 / 18:30");
}

#[tokio::test]
async fn fetch_event_unwraps_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/events/e1");
            then.status(200).json_body(json!({ "event": hike() }));
        })
        .await;

    // Trailing slash is tolerated
    let client = ApiClient::new(format!("{}/", server.base_url())).unwrap();
    let event = client.fetch_event("e1", CancellationToken::new()).await.unwrap();
    assert_eq!(event.id, "e1");
    assert_eq!(event.location, "Trailhead");
}

#[tokio::test]
async fn not_found_keeps_backend_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/events/missing");
            then.status(404).json_body(json!({ "message": "Event not found." }));
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let err = client
        .fetch_event("missing", CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::NotFound);
    assert_eq!(err.code, Some(404));
    assert_eq!(err.info_message(), Some("Event not found."));
}

#[tokio::test]
async fn server_error_without_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/events/images");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let err = client.fetch_images(CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::Server);
    assert!(err.info_message().is_none());
    assert!(err.message.contains("upstream unavailable"));
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/events");
            then.status(200).body("<html>oops</html>");
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let err = client
        .fetch_events(EventListParams::default(), CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, TransportErrorKind::InvalidResponse);
}

#[tokio::test]
async fn create_wraps_draft_in_event_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/events")
                .json_body_partial(r#"{ "event": { "title": "Mountain hike", "date": "2024-03-05" } }"#);
            then.status(201).json_body(json!({ "event": hike() }));
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let draft = EventDraft {
        title: "Mountain hike".to_string(),
        date: "2024-03-05".to_string(),
        ..EventDraft::default()
    };
    let created = client.create_event(&draft).await.unwrap();

    mock.assert_async().await;
    assert_eq!(created.id, "e1");
}

#[tokio::test]
async fn update_and_delete_target_the_event() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/events/e1")
                .json_body_partial(r#"{ "event": { "title": "Mountain hike" } }"#);
            then.status(200).json_body(json!({ "event": hike() }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/events/e1");
            then.status(204);
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let draft = EventDraft {
        title: "Mountain hike".to_string(),
        ..EventDraft::default()
    };
    client.update_event("e1", &draft).await.unwrap();
    client.delete_event("e1").await.unwrap();

    update.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn rejected_write_reports_validation() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/events");
            then.status(422).json_body(json!({ "message": "Title is required." }));
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let err = client.create_event(&EventDraft::default()).await.unwrap_err();
    assert_eq!(err.kind, TransportErrorKind::Validation);
    assert_eq!(err.info_message(), Some("Title is required."));
}

#[tokio::test]
async fn cancelled_signal_aborts_request() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/events");
            then.status(200)
                .delay(Duration::from_secs(5))
                .json_body(json!({ "events": [] }));
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let signal = CancellationToken::new();
    signal.cancel();
    let err = client
        .fetch_events(EventListParams::default(), signal)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn event_id_is_one_path_segment() {
    let server = MockServer::start_async().await;
    let encoded = server
        .mock_async(|when, then| {
            when.method(GET).path("/events/a%2Fb%3Fc");
            then.status(200).json_body(json!({ "event": hike() }));
        })
        .await;
    let nested = server
        .mock_async(|when, then| {
            when.method(GET).path("/events/a/b");
            then.status(200).json_body(json!({ "event": hike() }));
        })
        .await;

    let client = ApiClient::new(server.base_url()).unwrap();
    let event = client
        .fetch_event("a/b?c", CancellationToken::new())
        .await
        .unwrap();

    encoded.assert_async().await;
    assert_eq!(nested.hits_async().await, 0);
    assert_eq!(event.id, "e1");
}
