//! S3-compatible object storage
//!
//! Only metadata calls are made: the reconciler needs to know whether an
//! object exists, never its contents.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    Client,
};
use tracing::{debug, info, instrument};

use crate::features::reconcile::ObjectProbe;

pub mod config;

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!(
            endpoint = ?config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            path_style = config.path_style,
            "Initializing storage"
        );

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some((access_key, secret_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "vstage-storage",
            ));
        }
        let shared = loader.load().await;

        let mut s3_config_builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(bucket = %config.bucket, "Storage client initialized");

        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `HeadObject` probe; only a genuine not-found maps to `Ok(false)`
    #[instrument(skip(self))]
    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    debug!(bucket = %self.bucket, key, "Object not found");
                    Ok(false)
                } else {
                    Err(anyhow!("Failed to check S3 object existence: {}", e))
                }
            },
        }
    }
}

#[async_trait]
impl ObjectProbe for Storage {
    async fn object_exists(&self, key: &str) -> Result<bool> {
        self.exists(key).await
    }
}
