//! RFC 9457 Problem Details for Lambda error responses.
//!
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use http::StatusCode;
use serde::{Deserialize, Serialize};

use geoitems_lib::Error as LibError;

/// Problem type URI for invalid request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for unknown item ids.
pub const PROBLEM_ITEM_NOT_FOUND: &str = "/problems/item-not-found";

/// Problem type URI for addresses the geocoder could not resolve.
pub const PROBLEM_GEOCODE_FAILED: &str = "/problems/geocode-failed";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// RFC 9457 problem document returned as the body of every error response.
///
/// # Example
///
/// ```
/// use geoitems_lambda_shared::{ProblemDetails, PROBLEM_ITEM_NOT_FOUND};
/// use http::StatusCode;
///
/// let problem = ProblemDetails::new(PROBLEM_ITEM_NOT_FOUND, "Item Not Found", StatusCode::NOT_FOUND)
///     .with_detail("an item with the id 'abc' could not be found")
///     .with_request_id("req-12345");
/// assert_eq!(problem.status, 404);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// The Lambda request id of the failing invocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// HTTP status as a [`StatusCode`], falling back to 500 for invalid values.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create a 400 Bad Request problem for invalid input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 404 Not Found problem for an unknown item id.
    pub fn item_not_found(id: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_ITEM_NOT_FOUND,
            "Item Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(format!("an item with the id '{id}' could not be found"))
        .with_request_id(request_id)
    }

    /// Create a 500 problem for an address that produced no coordinates.
    pub fn geocode_failed(address: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_GEOCODE_FAILED,
            "Geocoding Failed",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(format!("unable to geocode the address '{address}'"))
        .with_request_id(request_id)
    }

    /// Create a 500 Internal Server Error problem.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

/// Convert library errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_lib_error(err: &LibError, request_id: &str) -> ProblemDetails {
    match err {
        LibError::ItemNotFound { id } => ProblemDetails::item_not_found(id, request_id),
        LibError::GeocodeFailed { address } => ProblemDetails::geocode_failed(address, request_id),
        LibError::InvalidRadius { .. }
        | LibError::QueryTooBroad { .. }
        | LibError::InvalidHashKeyLength { .. } => {
            ProblemDetails::bad_request(err.to_string(), request_id)
        }
        LibError::GeocoderResponse { .. }
        | LibError::Store { .. }
        | LibError::MalformedRecord { .. }
        | LibError::Http(_)
        | LibError::Json(_) => ProblemDetails::internal_error(err.to_string(), request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_serialization() {
        let problem = ProblemDetails::bad_request("A name and address are required.", "req-1");
        let json = serde_json::to_value(&problem).unwrap();

        assert_eq!(json["type"], PROBLEM_INVALID_REQUEST);
        assert_eq!(json["status"], 400);
        assert_eq!(json["detail"], "A name and address are required.");
        assert_eq!(json["instance"], "req-1");
    }

    #[test]
    fn test_optional_fields_omitted() {
        let problem = ProblemDetails::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        let json = serde_json::to_string(&problem).unwrap();
        assert!(!json.contains("detail"));
        assert!(!json.contains("instance"));
    }

    #[test]
    fn test_not_found_mapping() {
        let err = LibError::ItemNotFound {
            id: "abc".to_string(),
        };
        let problem = from_lib_error(&err, "req-2");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.type_uri, PROBLEM_ITEM_NOT_FOUND);
        assert!(problem.detail.unwrap().contains("abc"));
    }

    #[test]
    fn test_search_bounds_are_bad_requests() {
        for err in [
            LibError::InvalidRadius {
                radius_meters: -1000.0,
            },
            LibError::QueryTooBroad {
                radius_meters: 2_000_000.0,
                cells: 90_000,
                limit: 4096,
            },
        ] {
            let problem = from_lib_error(&err, "req-4");
            assert_eq!(problem.status, 400);
            assert_eq!(problem.type_uri, PROBLEM_INVALID_REQUEST);
            assert_eq!(problem.detail.as_deref(), Some(err.to_string().as_str()));
        }
    }

    #[test]
    fn test_upstream_failures_are_internal() {
        let geocode = from_lib_error(
            &LibError::GeocodeFailed {
                address: "1 Nowhere".to_string(),
            },
            "req-3",
        );
        assert_eq!(geocode.status, 500);
        assert_eq!(geocode.type_uri, PROBLEM_GEOCODE_FAILED);

        let store = from_lib_error(&LibError::store("PutItem", "Table not found"), "req-3");
        assert_eq!(store.status, 500);
        assert_eq!(
            store.detail.as_deref(),
            Some("PutItem failed: Table not found")
        );
    }

    #[test]
    fn test_status_code_fallback() {
        let mut problem = ProblemDetails::internal_error("x", "req");
        problem.status = 1000;
        assert_eq!(problem.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
