use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;

use crate::config::StorageConfig;
use crate::error::{AssetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignMethod {
    Get,
    Put,
}

impl fmt::Display for SignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignMethod::Get => f.write_str("GET"),
            SignMethod::Put => f.write_str("PUT"),
        }
    }
}

/// Produces a query-signed URL for one object operation
#[async_trait]
pub trait RequestSigner: Send + Sync {
    async fn presign(&self, method: SignMethod, key: &str, expires_in: Duration) -> Result<String>;
}

/// SigV4 query signing through the S3 SDK.
///
/// Presigning is computed locally; no request is sent to the store.
pub struct S3Presigner {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Presigner {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        config.validate()?;

        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "stylist-static",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl RequestSigner for S3Presigner {
    async fn presign(&self, method: SignMethod, key: &str, expires_in: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| AssetError::Signing(e.to_string()))?;

        let request = match method {
            SignMethod::Get => self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| AssetError::Signing(DisplayErrorContext(e).to_string()))?,
            SignMethod::Put => self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| AssetError::Signing(DisplayErrorContext(e).to_string()))?,
        };

        Ok(request.uri().to_string())
    }
}
