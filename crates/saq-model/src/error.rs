use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid compliance level: {0}")]
    InvalidLevel(String),
    #[error("invalid applicability: {0}")]
    InvalidApplicability(String),
    #[error("invalid policy requirement id: {0}")]
    InvalidRequirementId(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
