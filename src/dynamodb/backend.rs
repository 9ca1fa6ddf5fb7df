//! The seam between [`DynamoDb`](crate::DynamoDb) and the remote service.
//!
//! A [`Backend`] performs exactly one remote request per call. The client
//! builds the requests, pages through results and reports outcomes; backends
//! only translate. [`SdkBackend`](crate::SdkBackend) talks to DynamoDB through
//! the AWS SDK, [`MemoryBackend`](crate::MemoryBackend) keeps tables in process.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::dynamodb::{Item, KeySchema, Result, Schema, Table};

/// Provisioned capacity of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

impl Throughput {
    /// Capacity every table is created with.
    pub const FIXED: Throughput = Throughput {
        read_capacity_units: 5,
        write_capacity_units: 5,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableRequest {
    pub name: String,
    pub key_schema: KeySchema,
    pub schema: Schema,
    pub throughput: Throughput,
}

/// One entry of a batch write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    /// Puts the whole item, replacing any item with the same key.
    Put(Item),
    /// Deletes the item with this primary key.
    Delete(Item),
}

/// Assignment of a single attribute, rendered as `SET #attr = :val1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub attribute: String,
    pub value: AttributeValue,
}

impl Update {
    pub const NAME_PLACEHOLDER: &'static str = "#attr";
    pub const VALUE_PLACEHOLDER: &'static str = ":val1";

    pub fn new(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }

    pub fn expression(&self) -> String {
        format!("SET {} = {}", Self::NAME_PLACEHOLDER, Self::VALUE_PLACEHOLDER)
    }
}

/// One page of a scan or query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    /// Key to resume from; `None` once the last page has been read.
    pub last_evaluated_key: Option<Item>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Describes a table, returning `None` when the service reports it missing.
    async fn describe_table(&self, name: &str) -> Result<Option<Table>>;

    async fn create_table(&self, request: &CreateTableRequest) -> Result<Table>;

    async fn batch_write(&self, table: &Table, requests: Vec<WriteRequest>) -> Result<()>;

    async fn get_item(&self, table: &Table, key: Item) -> Result<Option<Item>>;

    async fn update_item(&self, table: &Table, key: Item, update: &Update) -> Result<()>;

    async fn scan(&self, table: &Table, exclusive_start_key: Option<Item>) -> Result<Page>;

    /// Reads one page of the items whose partition key equals `partition_value`.
    async fn query(
        &self,
        table: &Table,
        partition_value: &AttributeValue,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page>;
}
