use geoitems_lambda_shared::test_utils::{
    chicago, event_with_item_id, fixture_runtime, lambda_event, response_json, springfield,
    FixtureRuntime, CHICAGO_ADDRESS, SPRINGFIELD_ADDRESS, UNKNOWN_ADDRESS,
};
use geoitems_lambda_shared::{ProxyResponse, PROBLEM_GEOCODE_FAILED, PROBLEM_ITEM_NOT_FOUND};
use geoitems_lambda_update::handler;
use geoitems_lib::{ItemAttributes, ItemId, SearchCenter};
use serde_json::json;

async fn create_cafe(fixture: &FixtureRuntime) -> ItemId {
    fixture
        .runtime
        .service()
        .create_item(&ItemAttributes::new("Cafe", SPRINGFIELD_ADDRESS))
        .await
        .expect("fixture item should be created")
}

async fn invoke(fixture: &FixtureRuntime, item_id: &str, body: serde_json::Value) -> ProxyResponse {
    let mut request = event_with_item_id(item_id);
    request.body = Some(body.to_string());
    handler(&fixture.runtime, lambda_event(request))
        .await
        .expect("handler should succeed")
}

async fn ids_near(fixture: &FixtureRuntime, center: geoitems_lib::GeoPoint) -> Vec<String> {
    fixture
        .runtime
        .service()
        .search_items(&SearchCenter::Point(center), 1000.0)
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect()
}

#[tokio::test]
async fn update_moves_item_to_new_address() {
    let fixture = fixture_runtime();
    let id = create_cafe(&fixture).await;

    let response = invoke(
        &fixture,
        id.as_str(),
        json!({"name": "Cafe Loop", "address": CHICAGO_ADDRESS}),
    )
    .await;

    assert_eq!(response.status_code, 204);
    assert!(ids_near(&fixture, springfield()).await.is_empty());
    assert_eq!(ids_near(&fixture, chicago()).await, vec![id.to_string()]);

    let record = fixture
        .runtime
        .service()
        .load_metadata(&id)
        .await
        .unwrap()
        .expect("metadata record should remain");
    assert_eq!(record.geo_point, chicago());
    assert_eq!(record.name.as_deref(), Some("Cafe Loop"));
}

#[tokio::test]
async fn update_in_place_renames_item() {
    let fixture = fixture_runtime();
    let id = create_cafe(&fixture).await;

    let response = invoke(
        &fixture,
        id.as_str(),
        json!({"name": "Corner Cafe", "address": SPRINGFIELD_ADDRESS}),
    )
    .await;
    assert_eq!(response.status_code, 204);

    let found = fixture
        .runtime
        .service()
        .search_items(&SearchCenter::Point(springfield()), 1000.0)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Corner Cafe");
    assert_eq!(fixture.index.len(), 1);
}

#[tokio::test]
async fn unknown_id_returns_not_found() {
    let fixture = fixture_runtime();

    let response = invoke(
        &fixture,
        "missing123",
        json!({"name": "Cafe", "address": CHICAGO_ADDRESS}),
    )
    .await;

    assert_eq!(response.status_code, 404);
    assert_eq!(response_json(&response)["type"], PROBLEM_ITEM_NOT_FOUND);
    assert_eq!(fixture.index.mutation_count(), 0);
}

#[tokio::test]
async fn ungeocodable_address_leaves_item_untouched() {
    let fixture = fixture_runtime();
    let id = create_cafe(&fixture).await;

    let response = invoke(
        &fixture,
        id.as_str(),
        json!({"name": "Cafe", "address": UNKNOWN_ADDRESS}),
    )
    .await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response_json(&response)["type"], PROBLEM_GEOCODE_FAILED);
    assert_eq!(
        ids_near(&fixture, springfield()).await,
        vec![id.to_string()]
    );
}

#[tokio::test]
async fn index_delete_failure_returns_error_text() {
    let fixture = fixture_runtime();
    let id = create_cafe(&fixture).await;
    fixture.index.set_fail_deletes(true);

    let response = invoke(
        &fixture,
        id.as_str(),
        json!({"name": "Cafe", "address": CHICAGO_ADDRESS}),
    )
    .await;

    assert_eq!(response.status_code, 500);
    let problem = response_json(&response);
    let detail = problem["detail"].as_str().unwrap();
    assert!(detail.contains("DeletePoint"), "{detail}");
    assert_eq!(
        ids_near(&fixture, springfield()).await,
        vec![id.to_string()]
    );
}
