use thiserror::Error;

/// Convenient result alias for the geoitems library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when no metadata record exists for the requested item id.
    #[error("an item with the id '{id}' could not be found")]
    ItemNotFound { id: String },

    /// Raised when the geocoder produced no coordinates for an address.
    #[error("unable to geocode the address '{address}'")]
    GeocodeFailed { address: String },

    /// Raised when the geocoding provider answered with a non-success status.
    #[error("geocoder returned HTTP {status}: {message}")]
    GeocoderResponse { status: u16, message: String },

    /// Raised when a table operation against the backing store fails.
    #[error("{operation} failed: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    /// Raised when a stored record is missing attributes or has the wrong shape.
    #[error("malformed record: {message}")]
    MalformedRecord { message: String },

    /// Raised when a radius query would touch too many geohash partitions.
    #[error("radius of {radius_meters} m covers {cells} hash key cells (limit {limit})")]
    QueryTooBroad {
        radius_meters: f64,
        cells: usize,
        limit: usize,
    },

    /// Raised when a search radius is not a positive number of meters within the limit.
    #[error(
        "search radius must be greater than 0 and at most {} m, got {radius_meters}",
        crate::service::MAX_SEARCH_RADIUS_METERS
    )]
    InvalidRadius { radius_meters: f64 },

    /// Raised when the configured hash key length is outside the supported range.
    #[error(
        "hash key length {length} is not supported; expected 1 to {}",
        crate::geohash::MAX_HASH_KEY_LENGTH
    )]
    InvalidHashKeyLength { length: u8 },

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a store error for the named table operation.
    pub fn store(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Store {
            operation,
            message: message.into(),
        }
    }

    /// Build a malformed record error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_id() {
        let err = Error::ItemNotFound {
            id: "abc123".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "an item with the id 'abc123' could not be found"
        );
    }

    #[test]
    fn store_error_includes_operation() {
        let err = Error::store("PutItem", "Throughput exceeded, please retry");
        assert_eq!(
            err.to_string(),
            "PutItem failed: Throughput exceeded, please retry"
        );
    }
}
