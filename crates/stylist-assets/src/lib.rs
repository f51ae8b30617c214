pub mod config;
pub mod error;
pub mod provider;
pub mod signer;

pub use config::StorageConfig;
pub use error::{AssetError, Result};
pub use provider::{SignedUrlProvider, UploadUrls};
pub use signer::{RequestSigner, S3Presigner, SignMethod};
