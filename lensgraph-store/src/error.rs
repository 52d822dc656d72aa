use rusqlite::{ffi, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("{entity} '{key}' already exists")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Turn UNIQUE / PRIMARY KEY violations into `StoreError::Duplicate`
pub(crate) fn duplicate_or(
    err: rusqlite::Error,
    entity: &'static str,
    key: impl ToString,
) -> anyhow::Error {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
        {
            StoreError::Duplicate {
                entity,
                key: key.to_string(),
            }
            .into()
        }
        _ => anyhow::Error::new(err),
    }
}
