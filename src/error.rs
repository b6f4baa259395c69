use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Raw driver message; surfaced verbatim to API clients.
    #[error("{0}")]
    Storage(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<diesel::result::Error> for PlannerError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub use crate::Result;
