#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl Error {
    pub(crate) fn invalid_data<S: Into<String>>(msg: S) -> Self {
        Error::InvalidData(msg.into())
    }

    pub(crate) fn unknown_operation<S: Into<String>>(msg: S) -> Self {
        Error::UnknownOperation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
