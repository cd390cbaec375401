use quarry_common::error::CommonError;
use quarry_json::error::JsonError;
use thiserror::Error;

pub type TableResult<T> = Result<T, TableError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TableError {
    /// A table object that could not be created, along with the underlying cause.
    #[error("{message} Caused by: {source}")]
    Construction {
        message: String,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing argument: {0}")]
    MissingArgument(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl TableError {
    pub fn construction(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        TableError::Construction {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        TableError::MissingArgument(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        TableError::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        TableError::NotSupported(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        TableError::InternalError(message.into())
    }
}

impl From<CommonError> for TableError {
    fn from(error: CommonError) -> Self {
        match error {
            CommonError::MissingArgument(message) => TableError::MissingArgument(message),
            CommonError::InvalidArgument(message) => TableError::InvalidArgument(message),
            CommonError::InvalidConfig(message) => {
                TableError::InvalidArgument(format!("invalid configuration: {message}"))
            }
            CommonError::NotSupported(message) => TableError::NotSupported(message),
            CommonError::InternalError(message) => TableError::InternalError(message),
        }
    }
}
