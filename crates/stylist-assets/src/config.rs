use std::fmt;
use std::time::Duration;

use crate::error::{AssetError, Result};

pub const DEFAULT_ENDPOINT_HOST: &str = "r2.cloudflarestorage.com";
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(3600);

/// Bucket identity and credentials for an S3-compatible store
#[derive(Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub account_id: String,
    /// Host suffix shared by every URL this store issues
    pub endpoint_host: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub url_expiry: Duration,
}

impl StorageConfig {
    pub fn new(
        bucket: impl Into<String>,
        account_id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            account_id: account_id.into(),
            endpoint_host: DEFAULT_ENDPOINT_HOST.to_string(),
            region: "auto".to_string(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            url_expiry: DEFAULT_URL_EXPIRY,
        }
    }

    /// Account-level endpoint; the bucket is added as a virtual host when signing
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.{}", self.account_id, self.endpoint_host)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("bucket", &self.bucket),
            ("account_id", &self.account_id),
            ("endpoint_host", &self.endpoint_host),
            ("access_key_id", &self.access_key_id),
            ("secret_access_key", &self.secret_access_key),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AssetError::Config(format!("{} is required", name)));
            }
        }

        if self.url_expiry.is_zero() {
            return Err(AssetError::Config("url_expiry must be positive".to_string()));
        }

        Ok(())
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("account_id", &self.account_id)
            .field("endpoint_host", &self.endpoint_host)
            .field("region", &self.region)
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field("url_expiry", &self.url_expiry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let config = StorageConfig::new("outfits", "acc123", "key", "secret");
        assert_eq!(config.endpoint_url(), "https://acc123.r2.cloudflarestorage.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let config = StorageConfig::new("outfits", "", "key", "secret");
        assert!(matches!(config.validate(), Err(AssetError::Config(_))));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = StorageConfig::new("outfits", "acc123", "AKIA-visible?", "s3cr3t");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cr3t"));
        assert!(!debug.contains("AKIA-visible?"));
    }
}
