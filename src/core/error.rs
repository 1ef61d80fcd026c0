use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Input(err.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("Scenario '{0}' not found")]
    NotFound(String),

    #[error("The default scenario '{0}' cannot be deleted")]
    DefaultNotDeletable(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),
}
