//! Error type shared by every client operation.
//!
//! SDK errors are mapped per operation: a `ResourceNotFoundException` becomes
//! [`Error::TableNotFound`], anything else is kept as [`Error::Service`] with the
//! full SDK error context rendered into the message.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

use crate::dynamodb::Operation;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The service identifier does not name a service this client can talk to.
    #[error("unknown service identifier '{0}'")]
    UnknownService(String),

    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// The table exists but never reported `ACTIVE` while being polled.
    #[error("table '{name}' is not active (last status: {status:?})")]
    TableNotActive {
        name: String,
        status: Option<String>,
    },

    /// Wraps any failure hit while checking for or creating a table.
    #[error("unable to create table '{name}': {source}")]
    CreateTable {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("item for table '{table}' is missing key attribute '{attribute}'")]
    MissingKeyAttribute { table: String, attribute: String },

    #[error("invalid key schema: {0}")]
    InvalidKeySchema(String),

    #[error("{operation} failed: {message}")]
    Service {
        operation: Operation,
        message: String,
    },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Serde(#[from] serde_dynamo::Error),
}

impl Error {
    /// Returns `true` when the error means the table does not exist.
    pub fn is_table_not_found(&self) -> bool {
        match self {
            Error::TableNotFound(_) => true,
            Error::CreateTable { source, .. } => source.is_table_not_found(),
            _ => false,
        }
    }
}

/// Maps an SDK error for `operation` against `table`.
pub(crate) fn map_sdk_error<E, R>(operation: Operation, table: &str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    if err.code() == Some("ResourceNotFoundException") {
        return Error::TableNotFound(table.to_string());
    }
    Error::Service {
        operation,
        message: DisplayErrorContext(&err).to_string(),
    }
}
