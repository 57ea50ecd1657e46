use geoitems_lambda_create::{handler, CreateItemResponse};
use geoitems_lambda_shared::test_utils::{
    event_with_body, fixture_runtime, lambda_event, response_json, springfield, FixtureRuntime,
    SPRINGFIELD_ADDRESS,
};
use geoitems_lambda_shared::{ProxyResponse, PROBLEM_INTERNAL_ERROR};
use geoitems_lib::{ItemId, PartitionKey, SearchCenter};
use geoitems_lib::MetadataStore;

async fn invoke(fixture: &FixtureRuntime, body: &str) -> ProxyResponse {
    handler(&fixture.runtime, lambda_event(event_with_body(body)))
        .await
        .expect("handler should succeed")
}

fn cafe_body() -> String {
    serde_json::json!({"name": "Cafe", "address": SPRINGFIELD_ADDRESS}).to_string()
}

#[tokio::test]
async fn created_item_is_found_by_radius_search() {
    let fixture = fixture_runtime();
    let response = invoke(&fixture, &cafe_body()).await;
    assert_eq!(response.status_code, 201);
    assert_eq!(response.content_type(), Some("application/json"));

    let created: CreateItemResponse =
        serde_json::from_str(response.body.as_deref().unwrap()).unwrap();

    let found = fixture
        .runtime
        .service()
        .search_items(&SearchCenter::Point(springfield()), 1000.0)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, created.id);
    assert_eq!(found[0].name, "Cafe");
    assert_eq!(found[0].address, SPRINGFIELD_ADDRESS);
}

#[tokio::test]
async fn created_item_has_metadata_record() {
    let fixture = fixture_runtime();
    let response = invoke(&fixture, &cafe_body()).await;
    let created: CreateItemResponse =
        serde_json::from_str(response.body.as_deref().unwrap()).unwrap();

    let id = ItemId::from(created.id.as_str());
    let record = fixture
        .metadata
        .get(&PartitionKey::derive(id.as_str()), &id)
        .await
        .unwrap()
        .expect("metadata record should exist");
    assert_eq!(record.geo_point, springfield());
}

#[tokio::test]
async fn each_create_generates_a_new_id() {
    let fixture = fixture_runtime();
    let first = response_json(&invoke(&fixture, &cafe_body()).await);
    let second = response_json(&invoke(&fixture, &cafe_body()).await);

    assert_ne!(first["id"], second["id"]);
    assert_eq!(fixture.index.len(), 2);
}

#[tokio::test]
async fn index_failure_returns_problem_and_writes_no_metadata() {
    let fixture = fixture_runtime();
    fixture.index.set_fail_puts(true);

    let response = invoke(&fixture, &cafe_body()).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.content_type(), Some("application/problem+json"));
    let problem = response_json(&response);
    assert_eq!(problem["type"], PROBLEM_INTERNAL_ERROR);
    assert!(problem["detail"].as_str().unwrap().contains("PutPoint"));
    assert!(fixture.metadata.is_empty());
}

#[tokio::test]
async fn metadata_failure_rolls_back_point() {
    let fixture = fixture_runtime();
    fixture.metadata.set_fail_puts(true);

    let response = invoke(&fixture, &cafe_body()).await;

    assert_eq!(response.status_code, 500);
    assert!(fixture.index.is_empty());
}
