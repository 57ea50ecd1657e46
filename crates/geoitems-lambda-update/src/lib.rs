//! AWS Lambda function for updating items.
//!
//! Re-geocodes the submitted address, moves the item's point in the geo index
//! and overwrites its metadata record. Answers 204, 400 for a bad request,
//! 404 for an unknown id, or 500 carrying the error text.

use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{error, info, warn};

use geoitems_lambda_shared::{
    from_lib_error, init_tracing, ItemRequest, LambdaRuntime, ProblemDetails, ProxyRequest,
    ProxyResponse, Validate,
};
use geoitems_lib::Error as LibError;

/// Message returned when the `itemId` path parameter is absent.
pub const MISSING_ITEM_ID: &str = "The 'itemId' path parameter is required";

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

    let Some(item_id) = event.payload.item_id() else {
        return Ok(ProxyResponse::from(ProblemDetails::bad_request(
            MISSING_ITEM_ID,
            &request_id,
        )));
    };

    let request: ItemRequest = match event.payload.json_body(&request_id) {
        Ok(req) => req,
        Err(problem) => {
            warn!(request_id = %request_id, item_id = %item_id, "failed to parse request body");
            return Ok(ProxyResponse::from(problem));
        }
    };

    if let Err(problem) = request.validate(&request_id) {
        return Ok(ProxyResponse::from(problem));
    }
    let attributes = request.into_attributes();

    info!(
        request_id = %request_id,
        item_id = %item_id,
        address = %attributes.address,
        "handling update request"
    );

    match runtime.service().update_item(&item_id, &attributes).await {
        Ok(()) => Ok(ProxyResponse::no_content()),
        Err(e @ LibError::ItemNotFound { .. }) => {
            warn!(request_id = %request_id, item_id = %item_id, "item not found");
            Ok(ProxyResponse::from(from_lib_error(&e, &request_id)))
        }
        Err(e) => {
            error!(request_id = %request_id, item_id = %item_id, error = %e, "failed to update item");
            Ok(ProxyResponse::from(from_lib_error(&e, &request_id)))
        }
    }
}
