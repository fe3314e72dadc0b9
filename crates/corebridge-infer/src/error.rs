//! Error types for schema inference.
//!
//! Inference failures are the only hard failures in the upload path: the
//! caller must surface them as a rejected upload, never as a silently
//! empty schema.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferError {
    #[error("uploaded content is empty")]
    EmptyContent,
    #[error("unsupported upload format for '{filename}'")]
    UnsupportedFormat { filename: String },
    #[error("no field columns could be derived from collection '{collection}'")]
    NoColumns { collection: String },
    #[error("delimited parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InferError>;
