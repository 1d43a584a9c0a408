use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request for {url} failed with status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Invalid asset path {path}: {reason}")]
    InvalidUrl { path: String, reason: String },
}
