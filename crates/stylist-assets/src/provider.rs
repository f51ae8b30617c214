use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use stylist_types::UrlRefresher;
use url::Url;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AssetError, Result};
use crate::signer::{RequestSigner, S3Presigner, SignMethod};

/// Result of [`SignedUrlProvider::issue_upload_url`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrls {
    pub upload_url: String,
    pub download_url: String,
    /// Storage key the client must reference when it later posts the image
    pub filename: String,
}

/// Mints time-limited upload/download links and re-signs stored ones
pub struct SignedUrlProvider {
    signer: Arc<dyn RequestSigner>,
    bucket: String,
    managed_host: String,
    expiry: Duration,
}

impl SignedUrlProvider {
    pub fn new(
        signer: Arc<dyn RequestSigner>,
        bucket: impl Into<String>,
        managed_host: impl Into<String>,
        expiry: Duration,
    ) -> Self {
        Self {
            signer,
            bucket: bucket.into(),
            managed_host: managed_host.into(),
            expiry,
        }
    }

    /// Provider signing with [`S3Presigner`]
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let signer = S3Presigner::new(config)?;
        Ok(Self::new(
            Arc::new(signer),
            config.bucket.clone(),
            config.endpoint_host.clone(),
            config.url_expiry,
        ))
    }

    pub async fn issue_upload_url(&self, filename: &str) -> Result<UploadUrls> {
        let key = format!("{}-{}", Uuid::new_v4(), filename);

        let upload_url = self.signer.presign(SignMethod::Put, &key, self.expiry).await?;
        let download_url = self.signer.presign(SignMethod::Get, &key, self.expiry).await?;

        tracing::debug!(key = %key, "Issued upload URL");

        Ok(UploadUrls {
            upload_url,
            download_url,
            filename: key,
        })
    }

    pub async fn issue_download_url(&self, filename: &str) -> Result<String> {
        self.signer.presign(SignMethod::Get, filename, self.expiry).await
    }

    /// Fresh GET link for a previously issued URL.
    ///
    /// URLs outside the managed host come back untouched. Never fails: on any
    /// error the original URL is returned and the failure is logged.
    pub async fn refresh_url(&self, previous_url: &str) -> String {
        if !self.is_managed(previous_url) {
            return previous_url.to_string();
        }

        let key = match self.extract_key(previous_url) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(url = %previous_url, error = %e, "Could not extract storage key");
                return previous_url.to_string();
            }
        };

        match self.signer.presign(SignMethod::Get, &key, self.expiry).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Could not re-sign storage URL");
                previous_url.to_string()
            }
        }
    }

    /// True when the URL's host is the storage host or one of its subdomains
    fn is_managed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        parsed.host_str().is_some_and(|host| {
            host == self.managed_host || host.ends_with(&format!(".{}", self.managed_host))
        })
    }

    /// Object key from a virtual-hosted (`bucket.host/key`) or path-style
    /// (`host/bucket/key`) URL, percent-decoded
    fn extract_key(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| AssetError::InvalidUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| AssetError::InvalidUrl("missing host".to_string()))?;

        let path = parsed.path().strip_prefix('/').unwrap_or(parsed.path());
        let virtual_hosted = host.starts_with(&format!("{}.", self.bucket));
        let encoded_key = if virtual_hosted {
            path
        } else {
            path.strip_prefix(&format!("{}/", self.bucket)).unwrap_or(path)
        };

        let key = percent_decode_str(encoded_key)
            .decode_utf8()
            .map_err(|e| AssetError::InvalidUrl(e.to_string()))?;

        if key.is_empty() {
            return Err(AssetError::InvalidUrl("no object key in path".to_string()));
        }

        Ok(key.into_owned())
    }
}

#[async_trait]
impl UrlRefresher for SignedUrlProvider {
    async fn refresh_url(&self, previous_url: &str) -> String {
        SignedUrlProvider::refresh_url(self, previous_url).await
    }
}
