//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to [`Error::Store`](crate::Error::Store).

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;

use crate::error::Error;

const THROTTLED: &str = "Throughput exceeded, please retry";
const REQUEST_LIMIT: &str = "Request limit exceeded, please retry";
const INTERNAL: &str = "DynamoDB internal server error";
const TABLE_NOT_FOUND: &str = "Table not found";

/// Map a GetItem SDK error.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> Error {
    const OP: &str = "GetItem";
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => Error::store(OP, TABLE_NOT_FOUND),
        GetItemError::ProvisionedThroughputExceededException(_) => Error::store(OP, THROTTLED),
        GetItemError::RequestLimitExceeded(_) => Error::store(OP, REQUEST_LIMIT),
        GetItemError::InternalServerError(_) => Error::store(OP, INTERNAL),
        err => Error::store(OP, format!("{err:?}")),
    }
}

/// Map a PutItem SDK error.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
) -> Error {
    const OP: &str = "PutItem";
    match err.into_service_error() {
        PutItemError::ResourceNotFoundException(_) => Error::store(OP, TABLE_NOT_FOUND),
        PutItemError::ProvisionedThroughputExceededException(_) => Error::store(OP, THROTTLED),
        PutItemError::RequestLimitExceeded(_) => Error::store(OP, REQUEST_LIMIT),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            Error::store(OP, "Item collection size limit exceeded")
        }
        PutItemError::TransactionConflictException(_) => {
            Error::store(OP, "Transaction conflict, please retry")
        }
        PutItemError::InternalServerError(_) => Error::store(OP, INTERNAL),
        err => Error::store(OP, format!("{err:?}")),
    }
}

/// Map a DeleteItem SDK error.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> Error {
    const OP: &str = "DeleteItem";
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(_) => Error::store(OP, TABLE_NOT_FOUND),
        DeleteItemError::ProvisionedThroughputExceededException(_) => Error::store(OP, THROTTLED),
        DeleteItemError::RequestLimitExceeded(_) => Error::store(OP, REQUEST_LIMIT),
        DeleteItemError::TransactionConflictException(_) => {
            Error::store(OP, "Transaction conflict, please retry")
        }
        DeleteItemError::InternalServerError(_) => Error::store(OP, INTERNAL),
        err => Error::store(OP, format!("{err:?}")),
    }
}

/// Map a Query SDK error.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(err: SdkError<QueryError, R>) -> Error {
    const OP: &str = "Query";
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => Error::store(OP, TABLE_NOT_FOUND),
        QueryError::ProvisionedThroughputExceededException(_) => Error::store(OP, THROTTLED),
        QueryError::RequestLimitExceeded(_) => Error::store(OP, REQUEST_LIMIT),
        QueryError::InternalServerError(_) => Error::store(OP, INTERNAL),
        err => Error::store(OP, format!("{err:?}")),
    }
}
