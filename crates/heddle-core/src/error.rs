use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

pub type Result<T> = std::result::Result<T, Error>;
