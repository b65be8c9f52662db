use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no files selected")]
    NoFiles,
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid server address {0}")]
    InvalidBaseUrl(String),
    #[error("session cookie contains invalid characters")]
    InvalidCookie,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned an unreadable response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),
}
