pub mod config;
pub mod dynamodb;
pub mod logging;

pub use dynamodb::{
    AttributeDefinition, AttributeType, Backend, DynamoDb, Error, Item, KeyElement, KeyRole,
    KeySchema, MemoryBackend, Observer, Operation, Result, Schema, SdkBackend, Table,
    TracingObserver,
};

#[cfg(test)]
mod tests;
