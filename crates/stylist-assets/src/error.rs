use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid storage URL: {0}")]
    InvalidUrl(String),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AssetError>;
