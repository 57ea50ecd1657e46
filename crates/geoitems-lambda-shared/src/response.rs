//! API Gateway proxy responses.

use std::collections::HashMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::problem::ProblemDetails;

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";
const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Response returned to API Gateway by every handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// A response with `data` serialized as the JSON body.
    ///
    /// Serialization failures become a 500 problem response.
    pub fn json<T: Serialize>(status: StatusCode, data: &T, request_id: &str) -> Self {
        match serde_json::to_string(data) {
            Ok(body) => Self::with_body(status, APPLICATION_JSON, body),
            Err(e) => {
                error!(request_id = %request_id, error = %e, "failed to serialize response body");
                Self::from(ProblemDetails::internal_error(e.to_string(), request_id))
            }
        }
    }

    /// 200 OK with a JSON body.
    pub fn ok<T: Serialize>(data: &T, request_id: &str) -> Self {
        Self::json(StatusCode::OK, data, request_id)
    }

    /// 201 Created with a JSON body.
    pub fn created<T: Serialize>(data: &T, request_id: &str) -> Self {
        Self::json(StatusCode::CREATED, data, request_id)
    }

    /// 204 No Content.
    pub fn no_content() -> Self {
        Self {
            status_code: StatusCode::NO_CONTENT.as_u16(),
            headers: HashMap::new(),
            body: None,
            is_base64_encoded: false,
        }
    }

    fn with_body(status: StatusCode, content_type: &str, body: String) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: HashMap::from([(CONTENT_TYPE.to_string(), content_type.to_string())]),
            body: Some(body),
            is_base64_encoded: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The `Content-Type` header, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).map(String::as_str)
    }
}

impl From<ProblemDetails> for ProxyResponse {
    fn from(problem: ProblemDetails) -> Self {
        let status = problem.status_code();
        // ProblemDetails only holds strings and integers.
        let body = serde_json::to_string(&problem).unwrap_or_default();
        Self::with_body(status, APPLICATION_PROBLEM_JSON, body)
    }
}

impl From<Box<ProblemDetails>> for ProxyResponse {
    fn from(problem: Box<ProblemDetails>) -> Self {
        Self::from(*problem)
    }
}
