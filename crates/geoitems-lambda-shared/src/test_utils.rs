//! Test utilities for Lambda handler testing.
//!
//! This module provides shared test infrastructure for all Lambda crates:
//! an in-memory [`LambdaRuntime`] wired to the library's test doubles, the
//! Springfield fixture address, and proxy event builders.
//!
//! # Usage
//!
//! These utilities are only available in test builds or with the
//! `test-utils` feature:
//!
//! ```ignore
//! use geoitems_lambda_shared::test_utils::{fixture_runtime, event_with_body, mock_request_id};
//!
//! #[tokio::test]
//! async fn test_handler() {
//!     let fixture = fixture_runtime();
//!     let event = event_with_body(r#"{"name":"Cafe","address":"123 Main St, Springfield, IL"}"#);
//!     // ... call the handler with fixture.runtime
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use lambda_runtime::{Context, LambdaEvent};

use geoitems_lib::{
    CleanupPolicy, GeoPoint, GeoTableConfig, InMemoryGeoIndex, InMemoryMetadataStore, ItemService,
    StaticGeocoder,
};

use crate::requests::ProxyRequest;
use crate::response::ProxyResponse;
use crate::runtime::LambdaRuntime;

/// Address the fixture geocoder resolves to [`springfield`].
pub const SPRINGFIELD_ADDRESS: &str = "123 Main St, Springfield, IL";

/// Address the fixture geocoder resolves to [`chicago`].
pub const CHICAGO_ADDRESS: &str = "233 S Wacker Dr, Chicago, IL";

/// Address the fixture geocoder has no result for.
pub const UNKNOWN_ADDRESS: &str = "1 Nowhere Lane, Atlantis";

pub fn springfield() -> GeoPoint {
    GeoPoint::new(39.78, -89.65)
}

pub fn chicago() -> GeoPoint {
    GeoPoint::new(41.8789, -87.6359)
}

/// An in-memory runtime plus handles on its doubles for assertions.
pub struct FixtureRuntime {
    pub runtime: LambdaRuntime,
    pub geocoder: Arc<StaticGeocoder>,
    pub index: Arc<InMemoryGeoIndex>,
    pub metadata: Arc<InMemoryMetadataStore>,
}

/// Build a runtime over in-memory stores with the fixture addresses.
pub fn fixture_runtime() -> FixtureRuntime {
    fixture_runtime_with_policy(CleanupPolicy::BestEffort)
}

/// Like [`fixture_runtime`] with an explicit delete cleanup policy.
pub fn fixture_runtime_with_policy(policy: CleanupPolicy) -> FixtureRuntime {
    let geocoder = Arc::new(
        StaticGeocoder::new()
            .with_address(SPRINGFIELD_ADDRESS, springfield())
            .with_address(CHICAGO_ADDRESS, chicago()),
    );
    let index = Arc::new(InMemoryGeoIndex::new(&GeoTableConfig::new("geo-items")));
    let metadata = Arc::new(InMemoryMetadataStore::new());
    let service = ItemService::new(geocoder.clone(), index.clone(), metadata.clone())
        .with_cleanup_policy(policy);

    FixtureRuntime {
        runtime: LambdaRuntime::new(service),
        geocoder,
        index,
        metadata,
    }
}

/// Create a mock request ID for testing.
pub fn mock_request_id(suffix: &str) -> String {
    format!("test-request-{suffix}")
}

/// Wrap a proxy request in a Lambda event with a default context.
pub fn lambda_event(request: ProxyRequest) -> LambdaEvent<ProxyRequest> {
    LambdaEvent::new(request, Context::default())
}

/// Wrap a proxy request in a Lambda event whose context carries `request_id`.
pub fn lambda_event_with_id(
    request: ProxyRequest,
    request_id: &str,
) -> LambdaEvent<ProxyRequest> {
    let mut event = lambda_event(request);
    event.context.request_id = request_id.to_string();
    event
}

/// A proxy request carrying `body`.
pub fn event_with_body(body: &str) -> ProxyRequest {
    ProxyRequest {
        body: Some(body.to_string()),
        ..ProxyRequest::default()
    }
}

/// A proxy request with the `itemId` path parameter set.
pub fn event_with_item_id(item_id: &str) -> ProxyRequest {
    let params = HashMap::from([("itemId".to_string(), item_id.to_string())]);
    ProxyRequest {
        path_parameters: Some(params),
        ..ProxyRequest::default()
    }
}

/// A proxy request with the given query string parameters.
pub fn event_with_query(pairs: &[(&str, &str)]) -> ProxyRequest {
    ProxyRequest {
        query_string_parameters: Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        ..ProxyRequest::default()
    }
}

/// Parse a response body as JSON.
///
/// # Panics
///
/// Panics if the response has no body or the body is not JSON.
pub fn response_json(response: &ProxyResponse) -> serde_json::Value {
    let body = response
        .body
        .as_deref()
        .expect("response should have a body");
    serde_json::from_str(body).expect("response body should be JSON")
}
