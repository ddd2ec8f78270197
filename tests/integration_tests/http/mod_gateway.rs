use crate::integration_tests::_support::config;
use httpmock::prelude::*;
use objquery::App;
use objquery::errors::{QueryError, TransportError};
use objquery::http::AuthOptions;
use objquery::query::{Constraint, ConstraintMap};
use objquery::utils::wire::{self, WireEvent};
use serde_json::json;

#[tokio::test]
async fn find_hits_listing_endpoint_with_app_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/classes/Todo")
                .header("X-LC-Id", "app-id")
                .header("X-LC-Key", "app-key")
                .header("X-LC-Session", "sess")
                .query_param("where", r#"{"done":{"$ne":true}}"#)
                .query_param("limit", "2")
                .query_param("order", "-updatedAt");
            then.status(200).json_body(json!({"results": [{"objectId": "1", "title": "x"}]}));
        })
        .await;

    let app = App::new(config(&server.base_url())).unwrap();
    let mut q = app.query("Todo");
    q.filter(ConstraintMap::new().field("done", Constraint::ne(true)))
        .unwrap()
        .limit(2)
        .order_by_str("updatedAt", "desc")
        .unwrap();
    let out = q.find(&AuthOptions::session("sess")).await.unwrap();
    mock.assert_async().await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get("title"), Some(&json!("x")));
}

#[tokio::test]
async fn scan_sends_master_key_and_cursor() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/scan/classes/Item")
                .header("X-LC-Key", "master-key,master")
                .query_param("limit", "1")
                .matches(|req| {
                    !req.query_params.as_ref().is_some_and(|q| q.iter().any(|(k, _)| k == "cursor"))
                });
            then.status(200).json_body(json!({"results": [{"objectId": "a"}], "cursor": "next-1"}));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/scan/classes/Item")
                .header("X-LC-Key", "master-key,master")
                .query_param("cursor", "next-1");
            then.status(200).json_body(json!({"results": [], "cursor": null}));
        })
        .await;

    let app = App::new(config(&server.base_url())).unwrap();
    let mut q = app.query("Item");
    q.limit(1);
    let mut it = q.scan(AuthOptions::default());
    assert_eq!(it.next().await.unwrap().value.len(), 1);
    assert!(it.next().await.unwrap().done);
    assert!(it.next().await.unwrap().done);
    first.assert_hits_async(1).await;
    second.assert_hits_async(1).await;
}

#[tokio::test]
async fn count_reads_count_field() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/classes/Todo")
                .query_param("limit", "0")
                .query_param("count", "1");
            then.status(200).json_body(json!({"results": [], "count": 12}));
        })
        .await;
    let app = App::new(config(&server.base_url())).unwrap();
    assert_eq!(app.query("Todo").count(&AuthOptions::default()).await.unwrap(), 12);
    mock.assert_async().await;
}

#[tokio::test]
async fn server_errors_map_to_http_transport_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/1.1/classes/Secret");
            then.status(403).json_body(json!({"code": 119, "error": "Forbidden to find by class permissions."}));
        })
        .await;
    let app = App::new(config(&server.base_url())).unwrap();
    match app.query("Secret").find(&AuthOptions::default()).await {
        Err(QueryError::Transport(TransportError::Http { status, code, message })) => {
            assert_eq!(status, 403);
            assert_eq!(code, 119);
            assert_eq!(message, "Forbidden to find by class permissions.");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/1.1/classes/Todo");
            then.status(200).body("<html>oops</html>");
        })
        .await;
    let app = App::new(config(&server.base_url())).unwrap();
    let err = app.query("Todo").find(&AuthOptions::default()).await.unwrap_err();
    assert!(matches!(err, QueryError::Transport(TransportError::InvalidResponse(_))));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let app = App::new(config("http://127.0.0.1:9")).unwrap();
    let err = app.query("Todo").find(&AuthOptions::default()).await.unwrap_err();
    match err {
        QueryError::Transport(TransportError::Network { url, .. }) => {
            assert_eq!(url.as_deref(), Some("http://127.0.0.1:9/1.1/classes/Todo"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn wire_events_capture_send_and_recv() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.path("/1.1/classes/Todo");
            then.status(200).json_body(json!({"results": []}));
        })
        .await;
    let app = App::new(config(&server.base_url())).unwrap();
    let _g = wire::capture();
    let mut q = app.query("Todo");
    q.limit(5);
    q.find(&AuthOptions::default()).await.unwrap();
    let url = format!("{}/1.1/classes/Todo", server.base_url());
    match wire::take().as_slice() {
        [WireEvent::Send { method, url: sent, query }, WireEvent::Recv { status, url: got, body }] => {
            assert_eq!(*method, "GET");
            assert_eq!(sent, &url);
            assert_eq!(query, &vec![("limit".to_string(), "5".to_string())]);
            assert_eq!(*status, 200);
            assert_eq!(got, &url);
            assert!(body.contains("results"));
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test]
async fn master_request_without_master_key_falls_back_to_app_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/1.1/scan/classes/Item")
                .header("X-LC-Key", "app-key");
            then.status(200).json_body(json!({"results": [], "cursor": null}));
        })
        .await;
    let mut cfg = config(&server.base_url());
    cfg.master_key = None;
    let app = App::new(cfg).unwrap();
    let mut it = app.query("Item").scan(AuthOptions::master());
    assert!(it.next().await.unwrap().done);
    mock.assert_async().await;
}
