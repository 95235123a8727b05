use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("payload exceeds maximum line budget")]
    Oversize,
    #[error("internal error: {0}")]
    Internal(String),
}

pub type TlResult<T> = Result<T, TlError>;
