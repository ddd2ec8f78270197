use crate::integration_tests::_support::replay_app;
use futures::TryStreamExt;
use objquery::errors::{QueryError, TransportError};
use objquery::http::AuthOptions;
use objquery::query::ConstraintMap;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::test]
async fn two_pages_then_done_without_extra_request() {
    let (app, gw) = replay_app(vec![
        Ok(json!({"results": [{"objectId": "a"}, {"objectId": "b"}], "cursor": "c1"})),
        Ok(json!({"results": [], "cursor": null})),
    ]);
    let mut it = app.query("Item").scan(AuthOptions::default());

    let p1 = it.next().await.unwrap();
    let ids: Vec<_> = p1.value.iter().filter_map(|r| r.object_id.clone()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(!p1.done);

    let p2 = it.next().await.unwrap();
    assert!(p2.value.is_empty() && p2.done);
    assert_eq!(gw.call_count(), 2);

    let p3 = it.next().await.unwrap();
    assert!(p3.value.is_empty() && p3.done);
    assert_eq!(gw.call_count(), 2);
}

#[tokio::test]
async fn final_page_with_terminal_cursor_is_not_dropped() {
    let (app, gw) = replay_app(vec![Ok(json!({"results": [{"objectId": "a"}], "cursor": null}))]);
    let mut it = app.query("Item").scan(AuthOptions::default());
    let p1 = it.next().await.unwrap();
    assert_eq!(p1.value.len(), 1);
    assert!(!p1.done);
    let p2 = it.next().await.unwrap();
    assert!(p2.value.is_empty());
    assert!(p2.done);
    assert_eq!(gw.call_count(), 1);
}

#[tokio::test]
async fn empty_page_with_live_cursor_keeps_going() {
    let (app, _gw) = replay_app(vec![
        Ok(json!({"results": [], "cursor": "c1"})),
        Ok(json!({"results": [{"objectId": "z"}], "cursor": null})),
    ]);
    let mut it = app.query("Item").scan(AuthOptions::default());
    let p1 = it.next().await.unwrap();
    assert!(p1.value.is_empty() && !p1.done);
    assert_eq!(it.next().await.unwrap().value.len(), 1);
    assert!(it.next().await.unwrap().done);
}

#[tokio::test]
async fn scan_uses_snapshot_and_master_credentials() {
    let (app, gw) = replay_app(vec![Ok(json!({"results": [], "cursor": null}))]);
    let mut q = app.query("Item");
    q.limit(3).filter(ConstraintMap::new().field("kind", "book")).unwrap();
    q.order_by("title", Default::default()).select(["title"]);
    let mut it = q.scan(AuthOptions { use_master_key: false, ..AuthOptions::default() });

    q.limit(99).filter(ConstraintMap::new().field("kind", "film")).unwrap();
    assert!(it.next().await.unwrap().done);

    let (req, opts) = &gw.calls()[0];
    assert_eq!(req.path, "/1.1/scan/classes/Item");
    assert_eq!(serde_json::to_value(&req.query).unwrap(), json!({"where": {"kind": "book"}, "limit": 3}));
    assert!(opts.use_master_key);
}

#[tokio::test]
async fn failed_next_can_be_retried() {
    let (app, gw) = replay_app(vec![
        Ok(json!({"results": [{"objectId": "a"}], "cursor": "c1"})),
        Err(TransportError::Network { message: "timeout".into(), url: None }),
        Ok(json!({"results": [{"objectId": "b"}], "cursor": "c2"})),
    ]);
    let mut it = app.query("Item").scan(AuthOptions::default());
    it.next().await.unwrap();
    assert!(matches!(it.next().await, Err(QueryError::Transport(TransportError::Network { .. }))));
    assert_eq!(it.cursor(), Some("c1"));
    it.next().await.unwrap();
    let calls = gw.calls();
    assert_eq!(calls[1].0.query.cursor.as_deref(), Some("c1"));
    assert_eq!(calls[2].0.query.cursor.as_deref(), Some("c1"));
    assert_eq!(it.cursor(), Some("c2"));
}

#[tokio::test]
async fn stream_and_each_visit_every_record() {
    let pages = || {
        vec![
            Ok(json!({"results": [{"n": 0}, {"n": 1}], "cursor": "c1"})),
            Ok(json!({"results": [{"n": 2}], "cursor": null})),
        ]
    };

    let (app, _gw) = replay_app(pages());
    let collected: Vec<_> = app
        .query("Item")
        .scan(AuthOptions::default())
        .into_stream()
        .try_concat()
        .await
        .unwrap();
    assert_eq!(collected.len(), 3);

    let (app, _gw) = replay_app(pages());
    let seen = Arc::new(AtomicUsize::new(0));
    let seen2 = seen.clone();
    let visited = app
        .query("Item")
        .each(AuthOptions::default(), move |rec, idx| {
            let seen = seen2.clone();
            async move {
                assert_eq!(rec.get("n"), Some(&json!(idx)));
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<(), QueryError>(())
            }
        })
        .await
        .unwrap();
    assert_eq!(visited, 3);
    assert_eq!(seen.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn stream_ends_after_error() {
    let (app, _gw) = replay_app(vec![
        Ok(json!({"results": [{"n": 0}], "cursor": "c1"})),
        Err(TransportError::InvalidResponse("garbage".into())),
    ]);
    let items: Vec<_> = futures::StreamExt::collect(app.query("Item").scan(AuthOptions::default()).into_stream()).await;
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].is_err());
}
