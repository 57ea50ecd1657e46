//! Address geocoding.
//!
//! [`Geocoder`] is the seam the handlers depend on; [`GeocodioClient`] is the
//! production implementation backed by the Geocodio HTTP API. Handlers never
//! call a geocoder directly but go through [`geocode_address`], which treats
//! provider failures and empty result sets alike as "no coordinates".

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Coordinates, GeoPoint};

/// Default Geocodio API base URL.
pub const DEFAULT_GEOCODIO_BASE_URL: &str = "https://api.geocod.io/v1.7";

/// One candidate location for an address, most likely first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    pub location: Coordinates,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Resolves free-text addresses into candidate coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Return every candidate for `address`, highest confidence first.
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>>;
}

/// Geocode an address, returning the first candidate's coordinates.
///
/// Provider errors are logged and reported as `None`, the same as an address
/// the provider could not match.
pub async fn geocode_address(geocoder: &dyn Geocoder, address: &str) -> Option<GeoPoint> {
    match geocoder.geocode(address).await {
        Ok(candidates) => {
            let point = candidates
                .into_iter()
                .next()
                .map(|candidate| GeoPoint::from(candidate.location));
            if point.is_none() {
                debug!(address = %address, "geocoder returned no results");
            }
            point
        }
        Err(e) => {
            warn!(address = %address, error = %e, "an error occurred while geocoding the address");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodioResponse {
    #[serde(default)]
    results: Vec<GeocodeCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeocodioErrorBody {
    error: String,
}

/// Geocoder backed by the Geocodio `/geocode` endpoint.
pub struct GeocodioClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeocodioClient {
    /// Create a client against `base_url` with a per-request timeout.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("geoitems/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/geocode", self.base_url)
    }
}

impl std::fmt::Debug for GeocodioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodioClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Geocoder for GeocodioClient {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>> {
        let response = self
            .http
            .get(self.endpoint())
            .query(&[("q", address), ("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::GeocoderResponse {
                status: status.as_u16(),
                message: parse_error_message(&body),
            });
        }

        parse_geocode_response(&body)
    }
}

/// Parse a Geocodio success body into its candidate list.
pub fn parse_geocode_response(body: &str) -> Result<Vec<GeocodeCandidate>> {
    let response: GeocodioResponse = serde_json::from_str(body)?;
    Ok(response.results)
}

fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<GeocodioErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}
