use std::error::Error;

use thiserror::Error;

pub mod client;
pub mod database;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => Self::NotFound,
            database::DatabaseError::AlreadyExists => Self::AlreadyExists,
            database::DatabaseError::Other(why) => Self::Other(why),
        }
    }
}

pub type RequestResult<O> = Result<O, RequestError>;
