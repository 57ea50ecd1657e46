//! Request types and validation for Lambda endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use geoitems_lib::{
    GeoPoint, ItemAttributes, ItemId, SearchCenter, DEFAULT_SEARCH_RADIUS_METERS,
    MAX_SEARCH_RADIUS_METERS,
};

use crate::ProblemDetails;

/// Message returned when an item body lacks a usable name or address.
pub const MISSING_ITEM_FIELDS: &str = "A name and address are required.";

/// Message returned when a search has neither an address nor a valid point.
pub const MISSING_SEARCH_CENTER: &str =
    "Either an address or valid lat and lng parameters are required.";

/// Validation trait for Lambda request types.
///
/// Implementations should validate all fields and return a `ProblemDetails`
/// error for invalid input.
pub trait Validate {
    /// Validate the request, returning an error if invalid.
    ///
    /// The `request_id` is used to populate the `instance` field of any
    /// returned `ProblemDetails`.
    ///
    /// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

/// API Gateway REST proxy integration event.
///
/// Only the parts the handlers read are modelled; everything else in the
/// event is ignored during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub http_method: Option<String>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,

    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,

    #[serde(default)]
    pub body: Option<String>,
}

impl ProxyRequest {
    /// Look up a path parameter by name.
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    /// Look up a query string parameter by name.
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    /// The `itemId` path parameter, if present and not blank.
    pub fn item_id(&self) -> Option<ItemId> {
        self.path_parameter("itemId")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ItemId::from)
    }

    /// Parse the JSON body into `T`.
    ///
    /// A missing body or one that is not valid JSON for `T` becomes a 400
    /// problem.
    pub fn json_body<T>(&self, request_id: &str) -> Result<T, Box<ProblemDetails>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let body = self.body.as_deref().unwrap_or_default();
        serde_json::from_str(body).map_err(|e| {
            Box::new(ProblemDetails::bad_request(
                format!("The request body is not valid JSON: {e}"),
                request_id,
            ))
        })
    }
}

/// Body of the create and update endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub address: Option<String>,
}

impl ItemRequest {
    /// Convert a validated request into item attributes.
    ///
    /// Call [`Validate::validate`] first; blank fields are passed through as-is.
    pub fn into_attributes(self) -> ItemAttributes {
        ItemAttributes::new(
            self.name.unwrap_or_default(),
            self.address.unwrap_or_default(),
        )
    }
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl Validate for ItemRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if is_blank(self.name.as_ref()) || is_blank(self.address.as_ref()) {
            return Err(Box::new(ProblemDetails::bad_request(
                MISSING_ITEM_FIELDS,
                request_id,
            )));
        }
        Ok(())
    }
}

/// Query parameters of the search endpoint, kept as the raw strings received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub lat: Option<String>,

    #[serde(default)]
    pub lng: Option<String>,

    #[serde(default)]
    pub radius: Option<String>,
}

impl SearchRequest {
    /// Collect the search parameters from a proxy event.
    pub fn from_proxy(request: &ProxyRequest) -> Self {
        let param = |name: &str| request.query_parameter(name).map(str::to_string);
        Self {
            address: param("address"),
            lat: param("lat"),
            lng: param("lng"),
            radius: param("radius"),
        }
    }

    /// The search center: a non-blank address wins over coordinates.
    pub fn center(&self) -> Option<SearchCenter> {
        if let Some(address) = self.address.as_deref().map(str::trim) {
            if !address.is_empty() {
                return Some(SearchCenter::Address(address.to_string()));
            }
        }

        let lat = parse_number(self.lat.as_deref())?;
        let lng = parse_number(self.lng.as_deref())?;
        let point = GeoPoint::new(lat, lng);
        point.is_valid().then_some(SearchCenter::Point(point))
    }

    /// The requested radius in meters, or the default when none was given.
    ///
    /// Returns `None` for a radius that is not a finite number in
    /// `(0, MAX_SEARCH_RADIUS_METERS]`.
    pub fn radius_meters(&self) -> Option<f64> {
        match self.radius.as_deref().map(str::trim) {
            None | Some("") => Some(DEFAULT_SEARCH_RADIUS_METERS),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|r| r.is_finite() && *r > 0.0 && *r <= MAX_SEARCH_RADIUS_METERS),
        }
    }
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl Validate for SearchRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.center().is_none() {
            return Err(Box::new(ProblemDetails::bad_request(
                MISSING_SEARCH_CENTER,
                request_id,
            )));
        }

        if self.radius_meters().is_none() {
            return Err(Box::new(ProblemDetails::bad_request(
                format!(
                    "The 'radius' parameter must be a positive number of meters no greater than {MAX_SEARCH_RADIUS_METERS}"
                ),
                request_id,
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(pairs: &[(&str, &str)]) -> SearchRequest {
        let request = ProxyRequest {
            query_string_parameters: Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..ProxyRequest::default()
        };
        SearchRequest::from_proxy(&request)
    }

    #[test]
    fn test_proxy_request_deserializes_camel_case() {
        let event: ProxyRequest = serde_json::from_str(
            r#"{
                "httpMethod": "DELETE",
                "path": "/items/abc",
                "pathParameters": {"itemId": "abc"},
                "queryStringParameters": null,
                "body": null,
                "requestContext": {"stage": "prod"}
            }"#,
        )
        .unwrap();

        assert_eq!(event.http_method.as_deref(), Some("DELETE"));
        assert_eq!(event.item_id(), Some(ItemId::from("abc")));
        assert!(event.query_parameter("lat").is_none());
    }

    #[test]
    fn test_blank_item_id_is_missing() {
        let request = ProxyRequest {
            path_parameters: Some(HashMap::from([("itemId".to_string(), "  ".to_string())])),
            ..ProxyRequest::default()
        };
        assert!(request.item_id().is_none());
    }

    #[test]
    fn test_json_body_rejects_missing_and_invalid() {
        let missing = ProxyRequest::default();
        assert_eq!(
            missing.json_body::<ItemRequest>("req").unwrap_err().status,
            400
        );

        let invalid = ProxyRequest {
            body: Some("{name:".to_string()),
            ..ProxyRequest::default()
        };
        assert_eq!(
            invalid.json_body::<ItemRequest>("req").unwrap_err().status,
            400
        );
    }

    #[test]
    fn test_item_request_validation() {
        let valid = ItemRequest {
            name: Some("Cafe".to_string()),
            address: Some("123 Main St".to_string()),
        };
        assert!(valid.validate("req").is_ok());

        let missing_name = ItemRequest {
            name: None,
            ..valid.clone()
        };
        let err = missing_name.validate("req").unwrap_err();
        assert_eq!(err.detail.as_deref(), Some(MISSING_ITEM_FIELDS));

        let blank_address = ItemRequest {
            address: Some("   ".to_string()),
            ..valid
        };
        assert!(blank_address.validate("req").is_err());
    }

    #[test]
    fn test_search_defaults_radius() {
        let request = search(&[("lat", "39.78"), ("lng", "-89.65")]);
        assert!(request.validate("req").is_ok());
        assert_eq!(request.radius_meters(), Some(DEFAULT_SEARCH_RADIUS_METERS));
        assert_eq!(
            request.center(),
            Some(SearchCenter::Point(GeoPoint::new(39.78, -89.65)))
        );
    }

    #[test]
    fn test_search_address_takes_precedence() {
        let request = search(&[("address", "1 Main St"), ("lat", "x")]);
        assert_eq!(
            request.center(),
            Some(SearchCenter::Address("1 Main St".to_string()))
        );
    }

    #[test]
    fn test_search_rejects_malformed_coordinates() {
        for pairs in [
            vec![("lat", "abc"), ("lng", "-89.65")],
            vec![("lat", "39.78")],
            vec![("lat", "NaN"), ("lng", "1")],
            vec![("lat", "91"), ("lng", "0")],
            vec![("lat", "0"), ("lng", "-181")],
            vec![("address", "  ")],
            vec![],
        ] {
            let err = search(&pairs).validate("req").unwrap_err();
            assert_eq!(err.status, 400, "{pairs:?}");
            assert_eq!(err.detail.as_deref(), Some(MISSING_SEARCH_CENTER));
        }
    }

    #[test]
    fn test_search_radius_bounds() {
        let base = [("lat", "0"), ("lng", "0")];
        for bad in ["0", "-5", "abc", "inf", "50000.1"] {
            let mut pairs = base.to_vec();
            pairs.push(("radius", bad));
            assert!(search(&pairs).validate("req").is_err(), "radius {bad}");
        }

        let mut pairs = base.to_vec();
        pairs.push(("radius", "1000"));
        assert_eq!(search(&pairs).radius_meters(), Some(1000.0));
    }
}
