use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Unknown activity label: {0}")]
    UnknownLabel(String),
}
