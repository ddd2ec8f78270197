use crate::integration_tests::_support::replay_app;
use objquery::decoder::{FnDecoder, SerdeDecoder};
use objquery::errors::{QueryError, TransportError};
use objquery::http::{AuthOptions, Method};
use objquery::query::{Constraint, ConstraintMap, Order};
use objquery::App;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize, PartialEq)]
struct Todo {
    title: String,
    #[serde(default)]
    priority: i64,
}

#[tokio::test]
async fn find_sends_params_and_decodes_results() {
    let (app, gw) = replay_app(vec![Ok(json!({"results": [
        {"objectId": "t1", "title": "a", "priority": 2},
        {"objectId": "t2", "title": "b"}
    ]}))]);
    let mut q = app.query_with("Todo", SerdeDecoder::<Todo>::new());
    q.filter(ConstraintMap::new().field("priority", Constraint::gte(1)))
        .unwrap()
        .order_by("createdAt", Order::Desc)
        .include(["owner"])
        .select(["title", "priority"])
        .skip(10)
        .limit(2);
    let todos = q.find(&AuthOptions::session("s-1")).await.unwrap();
    assert_eq!(
        todos,
        vec![Todo { title: "a".into(), priority: 2 }, Todo { title: "b".into(), priority: 0 }]
    );

    let calls = gw.calls();
    assert_eq!(calls.len(), 1);
    let (req, opts) = &calls[0];
    assert_eq!(req.method, Method::Get);
    assert_eq!(req.path, "/1.1/classes/Todo");
    assert_eq!(serde_json::to_value(&req.query).unwrap(), json!({
        "where": {"priority": {"$gte": 1}},
        "skip": 10,
        "limit": 2,
        "order": "-createdAt",
        "include": "owner",
        "keys": "title,priority"
    }));
    assert_eq!(opts.session_token.as_deref(), Some("s-1"));
    assert!(!opts.use_master_key);
}

#[tokio::test]
async fn find_without_results_is_empty() {
    let (app, _gw) = replay_app(vec![Ok(json!({}))]);
    assert!(app.query("Todo").find(&AuthOptions::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn first_does_not_keep_limit() {
    let (app, gw) = replay_app(vec![
        Ok(json!({"results": [{"objectId": "x", "title": "t"}]})),
        Ok(json!({"results": []})),
    ]);
    let mut q = app.query("Todo");
    q.limit(10);
    let first = q.first(&AuthOptions::default()).await.unwrap().unwrap();
    assert_eq!(first.object_id.as_deref(), Some("x"));
    assert_eq!(gw.calls()[0].0.query.limit, Some(1));
    assert_eq!(q.params().limit, Some(10));

    assert!(q.first(&AuthOptions::default()).await.unwrap().is_none());
    assert_eq!(q.params().limit, Some(10));
}

#[tokio::test]
async fn first_failure_keeps_limit() {
    let (app, _gw) = replay_app(vec![Err(TransportError::Http {
        status: 500,
        code: 1,
        message: "boom".into(),
    })]);
    let mut q = app.query("Todo");
    q.limit(10);
    assert!(matches!(q.first(&AuthOptions::default()).await, Err(QueryError::Transport(_))));
    assert_eq!(q.params().limit, Some(10));
}

#[tokio::test]
async fn count_forces_zero_limit_and_count_flag() {
    let (app, gw) = replay_app(vec![Ok(json!({"count": 42, "results": []})), Ok(json!({}))]);
    let mut q = app.query("Todo");
    q.limit(100).filter(ConstraintMap::new().field("done", false)).unwrap();
    assert_eq!(q.count(&AuthOptions::default()).await.unwrap(), 42);
    assert_eq!(q.count(&AuthOptions::default()).await.unwrap(), 0);

    let query = &gw.calls()[0].0.query;
    assert_eq!(query.limit, Some(0));
    assert_eq!(query.count, Some(1));
    assert_eq!(query.condition.clone().unwrap().into_value(), json!({"done": false}));
    assert_eq!(q.params().limit, Some(100));
}

#[tokio::test]
async fn transport_errors_pass_through_unchanged() {
    let err = TransportError::Http { status: 404, code: 101, message: "Class or object doesn't exists.".into() };
    let (app, _gw) = replay_app(vec![Err(err.clone())]);
    match app.query("Missing").find(&AuthOptions::default()).await {
        Err(QueryError::Transport(e)) => assert_eq!(e, err),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_where_fails_before_any_request() {
    let (app, gw) = replay_app(vec![]);
    let mut q = app.query("Todo");
    assert!(q.filter(json!("title")).is_err());
    assert!(q.filter_cmd("title", "like", vec![json!("x")]).is_err());
    assert!(q.order_by_str("title", "random").is_err());
    assert_eq!(gw.call_count(), 0);
}

#[tokio::test]
async fn custom_decoder_sees_app_and_class() {
    let (app, _gw) = replay_app(vec![Ok(json!({"results": [{"objectId": "1"}]}))]);
    let decoder = FnDecoder::new(|app: &App, data: Value, class: &str| {
        Ok(format!("{}/{class}/{}", app.config().app_id, data["objectId"].as_str().unwrap_or("")))
    });
    let out = app.query_with("Note", decoder).find(&AuthOptions::default()).await.unwrap();
    assert_eq!(out, vec!["app-id/Note/1".to_string()]);
}

#[tokio::test]
async fn decode_failure_surfaces() {
    let (app, _gw) = replay_app(vec![Ok(json!({"results": [{"priority": 1}]}))]);
    let q = app.query_with("Todo", SerdeDecoder::<Todo>::new());
    assert!(matches!(q.find(&AuthOptions::default()).await, Err(QueryError::Decode(_))));
}
