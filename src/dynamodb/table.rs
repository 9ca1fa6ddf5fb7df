use aws_sdk_dynamodb::primitives::DateTime;

use crate::dynamodb::{KeySchema, Schema};

/// Handle to a named remote table.
///
/// Handles are returned by [`DynamoDb::table_exists`](crate::DynamoDb::table_exists)
/// and [`DynamoDb::create_table`](crate::DynamoDb::create_table) and carry what
/// the service reported about the table when it was looked up. The key schema
/// is used to derive primary keys from items.
///
/// # Table Structure
///
/// - **Table Name**: unique within an AWS account and region.
/// - **Primary Key**: a partition key and an optional sort key.
/// - **Attribute Definitions**: types of the indexed (key) attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    key_schema: KeySchema,
    schema: Schema,
    status: Option<String>,
    creation_date_time: Option<DateTime>,
}

impl Table {
    pub fn new(name: impl Into<String>, key_schema: KeySchema) -> Self {
        Self {
            name: name.into(),
            key_schema,
            schema: Schema::new(),
            status: None,
            creation_date_time: None,
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_creation_date_time(mut self, creation_date_time: DateTime) -> Self {
        self.creation_date_time = Some(creation_date_time);
        self
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_schema(&self) -> &KeySchema {
        &self.key_schema
    }

    /// Returns the partition key of the table.
    pub fn partition_key(&self) -> &str {
        self.key_schema.partition_key()
    }

    /// Returns the sort key of the table, if any.
    pub fn sort_key(&self) -> Option<&str> {
        self.key_schema.sort_key()
    }

    /// Returns the attribute definitions the table was created with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Table status as last reported by the service (`CREATING`, `ACTIVE`, ...).
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn creation_date_time(&self) -> Option<&DateTime> {
        self.creation_date_time.as_ref()
    }
}
