use thiserror::Error;

#[derive(Error, Debug)]
pub enum RichDiffError {
    /// A caller handed over a value that violates a precondition, such as an
    /// edit script where a document was expected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RichDiffError>;

impl From<serde_json::Error> for RichDiffError {
    fn from(err: serde_json::Error) -> Self {
        RichDiffError::Serialization(err.to_string())
    }
}
