use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown system type: {0}")]
    UnknownSystemType(String),
    #[error("unknown semantic type: {0}")]
    UnknownSemanticType(String),
    #[error("unknown compliance tag: {0}")]
    UnknownComplianceTag(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
