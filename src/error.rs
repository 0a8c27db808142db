use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain a session token. Always fatal for the run.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Network error during login: {0}")]
    Network(String),

    #[error("Login rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Could not decode login response: {0}")]
    Decode(String),

    #[error("Unsupported login type '{0}', only password login is handled")]
    UnsupportedLoginType(String),

    #[error("Login succeeded but no token was returned")]
    MissingToken,

    #[error("Browser login failed: {0}")]
    Browser(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthError::Decode(err.to_string())
        } else {
            AuthError::Network(err.to_string())
        }
    }
}

/// Failure of a single page or thread request. The run continues.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("Could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Failure to hand a batch to the ingestion endpoint. Never retried here.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Refusing to deliver an empty batch")]
    EmptyBatch,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Ingestion rejected batch (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Network(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not extract text from {path}: {message}")]
    Extract { path: PathBuf, message: String },
}
