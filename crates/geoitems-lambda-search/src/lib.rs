//! AWS Lambda function for radius searches.
//!
//! Centers the search on `lat`/`lng` or a geocoded `address` query parameter
//! and returns every item within `radius` meters (default 5000) as
//! `[{id, name, address, coords: {lat, lng}}]`.

use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{error, info};

use geoitems_lambda_shared::{
    from_lib_error, init_tracing, LambdaRuntime, ProblemDetails, ProxyRequest, ProxyResponse,
    SearchRequest, Validate, MISSING_SEARCH_CENTER,
};

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
    let request = SearchRequest::from_proxy(&event.payload);

    if let Err(problem) = request.validate(&request_id) {
        return Ok(ProxyResponse::from(problem));
    }
    let (Some(center), Some(radius_meters)) = (request.center(), request.radius_meters()) else {
        return Ok(ProxyResponse::from(ProblemDetails::bad_request(
            MISSING_SEARCH_CENTER,
            &request_id,
        )));
    };

    info!(
        request_id = %request_id,
        center = ?center,
        radius_meters = radius_meters,
        "handling search request"
    );

    match runtime.service().search_items(&center, radius_meters).await {
        Ok(items) => {
            info!(request_id = %request_id, count = items.len(), "search completed");
            Ok(ProxyResponse::ok(&items, &request_id))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "search failed");
            Ok(ProxyResponse::from(from_lib_error(&e, &request_id)))
        }
    }
}
