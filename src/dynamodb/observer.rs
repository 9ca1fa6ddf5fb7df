use std::fmt;

use tracing::{error, info};

use crate::dynamodb::Error;

/// A client operation, as reported to an [`Observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTable,
    TableExists,
    AddItem,
    DeleteItem,
    GetItem,
    UpdateItem,
    Scan,
    Query,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateTable => "CreateTable",
            Operation::TableExists => "TableExists",
            Operation::AddItem => "AddItem",
            Operation::DeleteItem => "DeleteItem",
            Operation::GetItem => "GetItem",
            Operation::UpdateItem => "UpdateItem",
            Operation::Scan => "Scan",
            Operation::Query => "Query",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the outcome of every client operation.
///
/// The client never logs on its own; it hands each success and failure to the
/// observer it was built with. [`TracingObserver`] is the default and turns the
/// outcomes into `tracing` events.
pub trait Observer: Send + Sync + fmt::Debug {
    /// Called after `operation` against `table` succeeded. `detail` is a short
    /// human-readable description of what happened.
    fn succeeded(&self, operation: Operation, table: &str, detail: &str);

    /// Called after `operation` against `table` failed, before the error is
    /// returned to the caller.
    fn failed(&self, operation: Operation, table: &str, error: &Error);
}

/// Emits one `tracing` event per operation outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn succeeded(&self, operation: Operation, table: &str, detail: &str) {
        info!(%operation, table, "{detail}");
    }

    fn failed(&self, operation: Operation, table: &str, error: &Error) {
        error!(%operation, table, %error, "operation failed");
    }
}
