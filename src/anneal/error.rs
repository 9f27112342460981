use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid annealer configuration: {0}")]
    InvalidConfig(String),
}
