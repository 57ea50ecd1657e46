//! AWS Lambda function for creating items.
//!
//! Geocodes the submitted address, stores the point in the geo index and the
//! metadata record, and answers `201 {"id": ...}`.

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use geoitems_lambda_shared::{
    from_lib_error, init_tracing, ItemRequest, LambdaRuntime, ProxyRequest, ProxyResponse, Validate,
};

/// Body of a successful create response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateItemResponse {
    pub id: String,
}

/// Entry point used by the Lambda runtime.
pub async fn run() -> Result<(), Error> {
    init_tracing();

    let runtime = match LambdaRuntime::from_env().await {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Lambda runtime initialization failed");
            return Err(e.into());
        }
    };
    let runtime = &runtime;

    lambda_runtime::run(service_fn(move |event| handler(runtime, event))).await
}

/// Lambda handler invoked per request.
pub async fn handler(
    runtime: &LambdaRuntime,
    event: LambdaEvent<ProxyRequest>,
) -> Result<ProxyResponse, Error> {
    let request_id = event.context.request_id.clone();

    let request: ItemRequest = match event.payload.json_body(&request_id) {
        Ok(req) => req,
        Err(problem) => {
            warn!(request_id = %request_id, "failed to parse request body");
            return Ok(ProxyResponse::from(problem));
        }
    };

    if let Err(problem) = request.validate(&request_id) {
        return Ok(ProxyResponse::from(problem));
    }
    let attributes = request.into_attributes();

    info!(
        request_id = %request_id,
        name = %attributes.name,
        address = %attributes.address,
        "handling create request"
    );

    match runtime.service().create_item(&attributes).await {
        Ok(id) => {
            info!(request_id = %request_id, item_id = %id, "item created successfully");
            Ok(ProxyResponse::created(
                &CreateItemResponse {
                    id: id.into_string(),
                },
                &request_id,
            ))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "failed to create item");
            Ok(ProxyResponse::from(from_lib_error(&e, &request_id)))
        }
    }
}
