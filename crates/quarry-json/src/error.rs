use quarry_common::error::CommonError;
use thiserror::Error;

pub type JsonResult<T> = Result<T, JsonError>;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("error in JSON serde: {0}")]
    SerdeJson(#[from] serde_json::Error),
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
    /// A JSON value that does not conform to its value options.
    #[error("failed to parse JSON at {context}: {message}")]
    ParseError { context: String, message: String },
}

impl JsonError {
    pub fn missing(message: impl Into<String>) -> Self {
        JsonError::MissingArgument(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        JsonError::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        JsonError::NotSupported(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        JsonError::InternalError(message.into())
    }

    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        JsonError::ParseError {
            context: context.into(),
            message: message.into(),
        }
    }
}

impl From<CommonError> for JsonError {
    fn from(error: CommonError) -> Self {
        match error {
            CommonError::MissingArgument(message) => JsonError::MissingArgument(message),
            CommonError::InvalidArgument(message) => JsonError::InvalidArgument(message),
            CommonError::InvalidConfig(message) => {
                JsonError::InvalidArgument(format!("invalid configuration: {message}"))
            }
            CommonError::NotSupported(message) => JsonError::NotSupported(message),
            CommonError::InternalError(message) => JsonError::InternalError(message),
        }
    }
}
