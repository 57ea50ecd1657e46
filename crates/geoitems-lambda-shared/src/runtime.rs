//! Lambda runtime state built once per process.
//!
//! [`LambdaRuntime`] owns the [`ItemService`] with its geocoder, geo index and
//! metadata store clients. Each binary builds it in `main` before starting the
//! Lambda event loop and hands a shared reference to every invocation.
//!
//! # Cold-Start Performance
//!
//! Initialization logs `total_init_ms` so slow AWS credential or region
//! resolution shows up in CloudWatch.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use geoitems_lib::{
    DynamoGeoIndex, DynamoMetadataStore, Error as LibError, GeoTableConfig, GeocodioClient,
    ItemService,
};

use crate::config::Config;

/// Error during runtime initialization.
#[derive(Debug, Clone)]
pub struct InitError {
    pub message: String,
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lambda initialization failed: {}", self.message)
    }
}

impl std::error::Error for InitError {}

impl From<LibError> for InitError {
    fn from(err: LibError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Initialized Lambda runtime holding the item service.
pub struct LambdaRuntime {
    service: ItemService,
}

impl LambdaRuntime {
    /// Wrap an already-built service.
    pub fn new(service: ItemService) -> Self {
        Self { service }
    }

    /// Read [`Config`] from the environment and build the AWS-backed runtime.
    pub async fn from_env() -> Result<Self, InitError> {
        let config = Config::from_env()?;
        Self::from_config(&config).await
    }

    /// Build the production runtime: DynamoDB tables and the Geocodio client.
    pub async fn from_config(config: &Config) -> Result<Self, InitError> {
        let start = Instant::now();
        info!(
            table_name = %config.table_name,
            metadata_table_name = %config.metadata_table_name,
            hash_key_length = config.hash_key_length,
            cleanup_policy = ?config.cleanup_policy,
            "initializing Lambda runtime"
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint) = &config.dynamodb_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        let client = aws_sdk_dynamodb::Client::new(&sdk_config);

        let geocoder = GeocodioClient::new(
            config.geocodio_api_key.clone(),
            config.geocodio_base_url.clone(),
            config.geocoder_timeout,
        )?;
        let index = DynamoGeoIndex::new(
            client.clone(),
            GeoTableConfig::new(config.table_name.clone())
                .with_hash_key_length(config.hash_key_length),
        );
        let metadata = DynamoMetadataStore::new(client, config.metadata_table_name.clone());

        let service = ItemService::new(Arc::new(geocoder), Arc::new(index), Arc::new(metadata))
            .with_cleanup_policy(config.cleanup_policy);

        info!(
            total_init_ms = start.elapsed().as_millis() as u64,
            "Lambda runtime initialization complete"
        );
        Ok(Self::new(service))
    }

    /// Access the item service.
    pub fn service(&self) -> &ItemService {
        &self.service
    }
}

impl std::fmt::Debug for LambdaRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LambdaRuntime")
            .field("service", &self.service)
            .finish()
    }
}
