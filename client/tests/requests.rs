//! Request assembly and response classification through the full stack.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use serde_json::{Map, Value, json};
use std::sync::Arc;
use unrest_client::{Api, ApiConfig, HttpResponse, RootPath, Routes};
use unrest_core::event::EventBody;
use unrest_core::verb::Verb;
use unrest_testing::{MockTransport, TestStore};

fn routes() -> Routes {
    Routes::new()
        .route("fruit", "fruit")
        .route("color", "base/color/:id?")
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
async fn item_get_combines_path_and_query() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": [] })));
    let api = api_with(Arc::clone(&transport));
    let store = TestStore::new(&api);

    let thunk = api
        .actions("color")
        .unwrap()
        .get_item(
            params(&[("id", json!(5))]),
            Some(params(&[("offset", json!(0)), ("limit", json!(50))])),
        )
        .unwrap();
    thunk.run(&store).await.unwrap();

    let request = transport.last_request().expect("one exchange");
    assert_eq!(request.url, "/base/color/5?offset=0&limit=50");

    // The success event reports the merged request identity.
    let success = store
        .event_log()
        .into_iter()
        .find_map(|event| match event.body {
            EventBody::Success { parameters, .. } => Some(parameters),
            _ => None,
        })
        .expect("a success event");
    assert_eq!(
        success,
        params(&[("id", json!(5)), ("offset", json!(0)), ("limit", json!(50))])
    );
}

#[tokio::test(start_paused = true)]
async fn root_paths_join_without_doubled_slashes() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": [] })));
    let api = Api::new(
        routes(),
        ApiConfig::new()
            .with_transport(transport.clone())
            .with_root_path("/api/v1/"),
    )
    .unwrap();
    let store = TestStore::new(&api);

    api.actions("fruit").unwrap().get(None).run(&store).await.unwrap();
    assert_eq!(transport.last_request().unwrap().url, "/api/v1/fruit");
}

#[tokio::test(start_paused = true)]
async fn dynamic_root_paths_resolve_per_request() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": [] })));
    let api = Api::new(
        routes(),
        ApiConfig::new()
            .with_transport(transport.clone())
            .with_root_path(RootPath::Dynamic(Arc::new(|| "/v2".to_owned()))),
    )
    .unwrap();
    let store = TestStore::new(&api);

    api.actions("fruit").unwrap().get(None).run(&store).await.unwrap();
    assert_eq!(transport.last_request().unwrap().url, "/v2/fruit");
}

#[tokio::test(start_paused = true)]
async fn get_requests_carry_accept_but_no_body() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": [] })));
    let api = api_with(Arc::clone(&transport));
    let store = TestStore::new(&api);

    api.actions("color").unwrap().get(None).run(&store).await.unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(
        request.headers.get("accept").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(request.headers.get("content-type"), None);
    assert_eq!(request.body, None);
}

#[tokio::test(start_paused = true)]
async fn post_payloads_are_serialized_as_json_bodies() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": [] })));
    let api = api_with(Arc::clone(&transport));
    let store = TestStore::new(&api);

    api.actions("color")
        .unwrap()
        .post(Some(params(&[("name", json!("red"))])))
        .run(&store)
        .await
        .unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(
        request.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(request.body.as_deref(), Some("{\"name\":\"red\"}"));
}

#[tokio::test(start_paused = true)]
async fn payload_free_posts_send_no_body() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": [] })));
    let api = api_with(Arc::clone(&transport));
    let store = TestStore::new(&api);

    api.actions("color").unwrap().post(None).run(&store).await.unwrap();

    let request = transport.last_request().unwrap();
    assert_eq!(request.headers.get("content-type"), None);
    assert_eq!(request.body, None);
}

#[tokio::test(start_paused = true)]
async fn a_404_get_is_an_empty_success() {
    let transport = Arc::new(MockTransport::status(404, json!({ "message": "nope" })));
    let api = api_with(transport);
    let store = TestStore::new(&api);

    let report = api
        .actions("color")
        .unwrap()
        .get(None)
        .run(&store)
        .await
        .unwrap();

    assert_eq!(report.status(), "success");
    let state = store.state_of("color");
    assert!(state.objects.is_empty());
    assert_eq!(state.metadata.get("occurences"), Some(&json!(0)));
    assert_eq!(state.error, None);

    let events = api.events("color").unwrap();
    assert_eq!(
        store.event_kinds(),
        vec![events.fetch.clone(), events.success.clone()]
    );
}

#[tokio::test(start_paused = true)]
async fn acknowledgements_without_objects_preserve_the_collection() {
    // GET fills the collection; every mutating verb only gets a 202-style
    // acknowledgement back.
    let transport = Arc::new(MockTransport::new(|request| {
        Ok(match request.verb {
            Verb::Get => HttpResponse::json(
                200,
                &json!({ "objects": [{ "id": 1 }], "primary_keys": ["id"] }),
            ),
            _ => HttpResponse::json(202, &json!({ "accepted": true })),
        })
    }));
    let api = api_with(transport);
    let store = TestStore::new(&api);
    let actions = api.actions("color").unwrap();

    actions.get(None).run(&store).await.unwrap();
    assert_eq!(store.state_of("color").objects, vec![json!({ "id": 1 })]);

    let report = actions
        .post(Some(params(&[("id", json!(9))])))
        .run(&store)
        .await
        .unwrap();
    assert!(report.is_success());

    // The acknowledgement carried no object list, so the merge step was
    // skipped; only metadata moved.
    let state = store.state_of("color");
    assert_eq!(state.objects, vec![json!({ "id": 1 })]);
    assert_eq!(state.metadata.get("accepted"), Some(&json!(true)));
    assert_eq!(state.metadata.get("code"), Some(&json!(202)));
}

#[tokio::test(start_paused = true)]
async fn non_json_successes_surface_the_raw_body() {
    let transport = Arc::new(MockTransport::new(|_| {
        Ok(HttpResponse::text(200, "application/pdf", "%PDF-1.4"))
    }));
    let api = api_with(transport);
    let store = TestStore::new(&api);

    let report = api
        .actions("color")
        .unwrap()
        .get(None)
        .run(&store)
        .await
        .unwrap();

    match report {
        unrest_client::Report::Success { objects, metadata, raw } => {
            assert_eq!(objects, None);
            assert_eq!(metadata.get("code"), Some(&json!(200)));
            assert_eq!(metadata.get("content_type"), Some(&json!("application/pdf")));
            assert_eq!(raw.as_deref(), Some(b"%PDF-1.4".as_slice()));
        }
        other => panic!("expected a success report, got {other:?}"),
    }
    assert!(store.state_of("color").objects.is_empty());
}

#[tokio::test]
async fn item_calls_without_parameters_fail_before_dispatching() {
    let transport = Arc::new(MockTransport::json_ok(json!({ "objects": [] })));
    let api = api_with(transport);
    let store = TestStore::new(&api);

    let error = api
        .actions("color")
        .unwrap()
        .get_item(Map::new(), None)
        .expect_err("empty path parameters are a programmer error");
    assert_eq!(error.name(), "MissingParametersError");
    assert!(store.event_log().is_empty());
}
