//! Facade-level lifecycle tests: loading flags, error settlement,
//! in-flight arbitration, force and reset.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use unrest_client::{Api, ApiConfig, ErrorContext, Routes, TransportError};
use unrest_testing::{MockTransport, TestStore, test_clock};

fn routes() -> Routes {
    Routes::new()
        .route("fruit", "fruit")
        .route("color", "base/color/:id?")
        .route("tree", "forest/tree/:kind?/:age?")
}

fn params(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

fn api_with(transport: Arc<MockTransport>) -> Api {
    Api::new(routes(), ApiConfig::new().with_transport(transport)).expect("facade builds")
}

#[tokio::test(start_paused = true)]
async fn loading_rises_and_falls_through_success() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": ["response"] })));
    let api = api_with(Arc::clone(&transport));
    let store = TestStore::new(&api);

    assert!(!store.state_of("color").loading);
    let thunk = api.actions("color").unwrap().get(None);
    let (report, ()) = tokio::join!(thunk.run(&store), async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(store.state_of("color").loading);
    });

    assert!(report.unwrap().is_success());
    let state = store.state_of("color");
    assert!(!state.loading);
    assert_eq!(state.objects, vec![json!("response")]);
    assert_eq!(state.error, None);
    assert_eq!(state.metadata.get("code"), Some(&json!(200)));
}

#[tokio::test(start_paused = true)]
async fn loading_rises_and_falls_through_error() {
    let transport = Arc::new(MockTransport::status(
        500,
        json!({ "message": "This is the error" }),
    ));
    let api = api_with(transport);
    let store = TestStore::new(&api);

    let thunk = api.actions("color").unwrap().get(None);
    let (report, ()) = tokio::join!(thunk.run(&store), async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(store.state_of("color").loading);
    });

    let error = report.expect_err("the default handler propagates");
    assert_eq!(error.to_string(), "HttpError: [500] - This is the error");
    assert_eq!(error.name(), "HttpError");
    assert_eq!(error.code(), Some(500));

    let state = store.state_of("color");
    assert!(!state.loading);
    assert_eq!(
        state.error.as_deref(),
        Some("HttpError: [500] - This is the error")
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_fail_fast() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": ["data"] })));
    let api = api_with(transport);
    let store = TestStore::new(&api);

    let first = api.actions("color").unwrap().get(None);
    let second = api.actions("color").unwrap().get(None);
    let (first, second) = tokio::join!(first.run(&store), second.run(&store));

    assert!(first.unwrap().is_success());
    let error = second.expect_err("the collision propagates by default");
    assert_eq!(error.name(), "AlreadyLoadingError");
}

#[tokio::test(start_paused = true)]
async fn swallowed_collisions_still_let_the_first_request_land() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": ["data"] })));
    let seen: Arc<Mutex<Option<ErrorContext>>> = Arc::new(Mutex::new(None));
    let context_sink = Arc::clone(&seen);
    let api = Api::new(
        routes(),
        ApiConfig::new()
            .with_transport(transport)
            .with_error_handler(move |_, context, _| {
                *context_sink.lock().unwrap() = Some(context.clone());
                false
            }),
    )
    .unwrap();
    let store = TestStore::new(&api);

    let first = api.actions("color").unwrap().get(None);
    let second = api.actions("color").unwrap().get(None);
    let (first, second) = tokio::join!(first.run(&store), second.run(&store));

    assert!(first.unwrap().is_success());
    assert_eq!(second.unwrap().status(), "failed");
    assert_eq!(store.state_of("color").objects, vec![json!("data")]);

    // The hook saw the full request context.
    let context = seen.lock().unwrap().clone().expect("hook ran");
    assert_eq!(context.endpoint, "color");
    assert_eq!(context.url, "/base/color");
    assert_eq!(context.namespace, "api");

    // Collisions leave no trace in the event log beyond the first
    // request's lifecycle.
    let events = api.events("color").unwrap();
    assert_eq!(
        store.event_kinds(),
        vec![events.fetch.clone(), events.success.clone()]
    );
}

#[tokio::test(start_paused = true)]
async fn force_cancels_the_item_request_in_flight() {
    let transport = Arc::new(MockTransport::respond_with(|request| {
        json!({ "objects": [request.url] })
    }));
    let api = api_with(Arc::clone(&transport));
    let store = TestStore::new(&api);
    let actions = api.actions("color").unwrap();

    let first = actions.get_item(params(&[("id", json!(1))]), None).unwrap();
    let second = actions
        .force()
        .get_item(params(&[("id", json!(2))]), None)
        .unwrap();
    let (first, second) = tokio::join!(first.run(&store), second.run(&store));

    assert_eq!(first.unwrap().status(), "aborted");
    assert_eq!(second.unwrap().status(), "success");
    assert_eq!(store.state_of("color").objects, vec![json!("/base/color/2")]);
    // The cancelled exchange never reached the transport's answer.
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn force_event_order_is_fetch_fetch_abort_success() {
    let transport = Arc::new(MockTransport::respond_with(|request| {
        json!({ "objects": [request.url] })
    }));
    let api = api_with(transport);
    let store = TestStore::new(&api);
    let actions = api.actions("color").unwrap();

    let first = actions.get(None);
    let second = actions.force().get(None);
    let (first, second) = tokio::join!(first.run(&store), second.run(&store));

    assert_eq!(first.unwrap().status(), "aborted");
    assert_eq!(second.unwrap().status(), "success");

    let events = api.events("color").unwrap();
    assert_eq!(
        store.event_kinds(),
        vec![
            events.fetch.clone(),
            events.fetch.clone(),
            events.abort.clone(),
            events.success.clone(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn force_wins_even_when_the_cache_is_warm() {
    let transport = Arc::new(MockTransport::respond_with(|request| {
        json!({ "objects": [request.url] })
    }));
    let api = Api::new(
        routes(),
        ApiConfig::new()
            .with_transport(transport)
            .with_cache(Duration::from_millis(100))
            .with_clock(Arc::new(test_clock())),
    )
    .unwrap();
    let store = TestStore::new(&api);
    let actions = api.actions("color").unwrap();

    actions.get(None).run(&store).await.unwrap();
    let first = actions.get_item(params(&[("id", json!(2))]), None).unwrap();
    let second = actions.force().get(None);
    let (first, second) = tokio::join!(first.run(&store), second.run(&store));

    assert_eq!(first.unwrap().status(), "aborted");
    assert_eq!(second.unwrap().status(), "success");

    let events = api.events("color").unwrap();
    assert_eq!(
        store.event_kinds(),
        vec![
            events.fetch.clone(),
            events.success.clone(),
            events.fetch.clone(),
            events.fetch.clone(),
            events.abort.clone(),
            events.success.clone(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn stacked_forces_are_last_writer_wins() {
    let transport = Arc::new(MockTransport::respond_with(|request| {
        match &request.body {
            Some(body) => json!({
                "objects": [serde_json::from_str::<Value>(body).unwrap_or(Value::Null)]
            }),
            None => json!({ "objects": [] }),
        }
    }));
    let api = api_with(transport);
    let store = TestStore::new(&api);
    let actions = api.actions("color").unwrap();

    let first = actions.post(Some(params(&[("o", json!(1))])));
    let second = actions.force().post(None);
    let third = actions.force().post(Some(params(&[("o", json!(2))])));
    let (first, second, third) =
        tokio::join!(first.run(&store), second.run(&store), third.run(&store));

    assert_eq!(first.unwrap().status(), "aborted");
    assert_eq!(second.unwrap().status(), "aborted");
    assert_eq!(third.unwrap().status(), "success");
    // What happened to object 1 is unknowable, so it must not be merged.
    assert_eq!(store.state_of("color").objects, vec![json!({ "o": 2 })]);
    assert!(!api.in_flight("color"));
}

#[tokio::test(start_paused = true)]
async fn a_row_of_forces_aborts_everything_but_the_last() {
    let transport = Arc::new(MockTransport::respond_with(|request| {
        json!({ "objects": [request.url] })
    }));
    let api = api_with(transport);
    let store = TestStore::new(&api);
    let actions = api.actions("color").unwrap();

    let thunks: Vec<_> = (0..11).map(|_| actions.force().get(None)).collect();
    let reports =
        futures::future::join_all(thunks.into_iter().map(|thunk| thunk.run(&store))).await;

    let statuses: Vec<&str> = reports
        .iter()
        .map(|report| report.as_ref().unwrap().status())
        .collect();
    assert!(statuses[..10].iter().all(|status| *status == "aborted"));
    assert_eq!(statuses[10], "success");

    let events = api.events("color").unwrap();
    let kinds = store.event_kinds();
    assert_eq!(kinds.len(), 22);
    assert!(kinds[..11].iter().all(|kind| *kind == events.fetch));
    assert!(kinds[11..21].iter().all(|kind| *kind == events.abort));
    assert_eq!(kinds[21], events.success);
    assert!(!api.in_flight("color"));
}

#[tokio::test(start_paused = true)]
async fn reset_aborts_the_pending_request_and_restores_initial_state() {
    let transport = Arc::new(MockTransport::new(|_| {
        Err(TransportError::Network("we should never get here".to_owned()))
    }));
    let api = api_with(transport);
    let store = TestStore::new(&api);

    let thunk = api.actions("color").unwrap().get(None);
    let (report, ()) = tokio::join!(thunk.run(&store), async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(store.state_of("color").loading);
        assert!(api.in_flight("color"));
        let reset = api.actions("color").unwrap().reset().run(&store).await;
        assert_eq!(reset.unwrap().status(), "reset");
        assert!(!store.state_of("color").loading);
    });

    assert_eq!(report.unwrap().status(), "aborted");
    assert!(store.state_of("color").objects.is_empty());
    assert!(!api.in_flight("color"));
}

#[tokio::test(start_paused = true)]
async fn endpoints_do_not_share_an_in_flight_slot() {
    let transport = Arc::new(MockTransport::respond_with(|request| {
        json!({ "objects": [request.url] })
    }));
    let api = api_with(transport);
    let store = TestStore::new(&api);

    let fruit = api.actions("fruit").unwrap().get(None);
    let color = api.actions("color").unwrap().get(None);
    let (fruit, color) = tokio::join!(fruit.run(&store), color.run(&store));

    assert!(fruit.unwrap().is_success());
    assert!(color.unwrap().is_success());
    assert_eq!(store.state_of("fruit").objects, vec![json!("/fruit")]);
    assert_eq!(store.state_of("color").objects, vec![json!("/base/color")]);
}
