use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown log level '{0}' (expected debug, info, warn, error or fatal)")]
    UnknownLevel(String),

    #[error("invalid value '{value}' for environment variable {key}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },
}
