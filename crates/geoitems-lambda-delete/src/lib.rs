//! AWS Lambda function for deleting items.
//!
//! Looks up the item's stored point through its metadata record, removes the
//! point from the geo index and then the record. Answers 204, or 404 for an
//! unknown id.

use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{error, info, warn};

use geoitems_lambda_shared::{
    from_lib_error, init_tracing, LambdaRuntime, ProblemDetails, ProxyRequest, ProxyResponse,
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

    info!(request_id = %request_id, item_id = %item_id, "handling delete request");

    match runtime.service().delete_item(&item_id).await {
        Ok(()) => Ok(ProxyResponse::no_content()),
        Err(e @ LibError::ItemNotFound { .. }) => {
            warn!(request_id = %request_id, item_id = %item_id, "item not found");
            Ok(ProxyResponse::from(from_lib_error(&e, &request_id)))
        }
        Err(e) => {
            error!(request_id = %request_id, item_id = %item_id, error = %e, "failed to delete item");
            Ok(ProxyResponse::from(from_lib_error(&e, &request_id)))
        }
    }
}
