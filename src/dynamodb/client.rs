use async_stream::try_stream;
use aws_sdk_dynamodb::types::AttributeValue;
use futures_util::{Stream, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::dynamodb::{
    Backend, CreateTableRequest, Error, Item, KeySchema, Observer, Operation, Page, Result,
    Schema, SdkBackend, Table, Throughput, TracingObserver, Update, WriteRequest,
};

/// Service identifier accepted by [`DynamoDb::connect`].
pub const SERVICE: &str = "dynamodb";

const ACTIVE_STATUS: &str = "ACTIVE";

/// DynamoDB client wrapper for table lifecycle and item operations.
///
/// Every method is a one-shot request against the backend (scans and queries
/// issue one request per page) and returns an explicit [`Result`]. Each
/// outcome is also handed to the client's [`Observer`], which logs through
/// `tracing` unless another one is injected with [`DynamoDb::with_observer`].
///
/// # Operations
///
/// - **CreateTable**: create a table unless it already exists
/// - **TableExists**: look a table up and probe its creation timestamp
/// - **Add / Delete**: single-item batch writes
/// - **Get**: fetch an item by primary key
/// - **Update**: set one attribute of an item
/// - **Scan / Query**: lazy, paginated streams of items
///
/// # Example
///
/// ```no_run
/// use aws_dynamodb_client::{AttributeType, DynamoDb, Item, KeySchema, Schema};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = DynamoDb::connect("dynamodb").await?;
///
///     let table = client
///         .create_table(
///             "users",
///             KeySchema::new("user_id"),
///             Schema::new().add_field("user_id", AttributeType::String),
///         )
///         .await?;
///
///     let item = Item::new()
///         .set_string("user_id", "123")
///         .set_string("email", "user@example.com");
///     client.add_item(&table, item).await?;
///
///     let key = Item::new().set_string("user_id", "123");
///     assert!(client.get_item(&table, key).await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct DynamoDb<B = SdkBackend> {
    backend: B,
    observer: Arc<dyn Observer>,
}

impl DynamoDb<SdkBackend> {
    /// Creates a client from an already loaded AWS SDK configuration.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::with_backend(SdkBackend::new(sdk_config))
    }

    /// Creates a client for the service named by `service`, loading region,
    /// credentials and endpoint from the environment.
    pub async fn connect(service: &str) -> Result<Self> {
        if service != SERVICE {
            return Err(Error::UnknownService(service.to_string()));
        }
        let sdk_config = aws_config::load_from_env().await;
        Ok(Self::new(&sdk_config))
    }
}

impl<B: Backend> DynamoDb<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the observer that receives operation outcomes.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn report<T>(
        &self,
        operation: Operation,
        table: &str,
        result: Result<T>,
        detail: impl FnOnce(&T) -> String,
    ) -> Result<T> {
        match &result {
            Ok(value) => self.observer.succeeded(operation, table, &detail(value)),
            Err(err) => self.observer.failed(operation, table, err),
        }
        result
    }

    // --- Table Operations ---

    /// Creates a table unless one with `name` already exists.
    ///
    /// An existing table is returned as is, without a create request. A new
    /// table is created with 5 read and 5 write capacity units. Any failure,
    /// during the existence check or the creation, is returned as
    /// [`Error::CreateTable`].
    pub async fn create_table(
        &self,
        name: &str,
        key_schema: KeySchema,
        schema: Schema,
    ) -> Result<Table> {
        let result = self
            .ensure_table(name, key_schema, schema)
            .await
            .map_err(|source| Error::CreateTable {
                name: name.to_string(),
                source: Box::new(source),
            });
        self.report(Operation::CreateTable, name, result, |(_, created)| {
            if *created {
                "table created".to_string()
            } else {
                "table already exists".to_string()
            }
        })
        .map(|(table, _)| table)
    }

    /// Returns the table and whether it had to be created.
    async fn ensure_table(
        &self,
        name: &str,
        key_schema: KeySchema,
        schema: Schema,
    ) -> Result<(Table, bool)> {
        if let Some(table) = self.table_exists(name).await? {
            return Ok((table, false));
        }
        let request = CreateTableRequest {
            name: name.to_string(),
            key_schema,
            schema,
            throughput: Throughput::FIXED,
        };
        let table = self.backend.create_table(&request).await?;
        Ok((table, true))
    }

    /// Looks up a table and probes its creation timestamp.
    ///
    /// Returns `Ok(None)` when the table does not exist or reports no
    /// creation timestamp.
    pub async fn table_exists(&self, name: &str) -> Result<Option<Table>> {
        let result = self
            .backend
            .describe_table(name)
            .await
            .map(|table| table.filter(|t| t.creation_date_time().is_some()));

        self.report(Operation::TableExists, name, result, |table| match table {
            Some(_) => "table is reachable".to_string(),
            None => "table does not exist".to_string(),
        })
    }

    /// Polls `name` until it reports `ACTIVE`, sleeping `interval` between
    /// lookups.
    ///
    /// A table created on the service starts out `CREATING` and rejects item
    /// requests until it is active. Gives up with [`Error::TableNotActive`]
    /// after `max_attempts` lookups.
    pub async fn wait_for_active(
        &self,
        name: &str,
        interval: Duration,
        max_attempts: usize,
    ) -> Result<Table> {
        let max_attempts = max_attempts.max(1);
        let mut last_status = None;
        for attempt in 1..=max_attempts {
            if let Some(table) = self.table_exists(name).await? {
                if table.status() == Some(ACTIVE_STATUS) {
                    return Ok(table);
                }
                last_status = table.status().map(str::to_string);
            }
            if attempt < max_attempts {
                sleep(interval).await;
            }
        }
        Err(Error::TableNotActive {
            name: name.to_string(),
            status: last_status,
        })
    }

    // --- Item Operations ---

    /// Writes `item` into `table` through a single-item batch write.
    pub async fn add_item(&self, table: &Table, item: Item) -> Result<()> {
        let summary = key_summary(table, &item);
        let result = self
            .backend
            .batch_write(table, vec![WriteRequest::Put(item)])
            .await;
        self.report(Operation::AddItem, table.name(), result, |_| {
            format!("added item {summary}")
        })
    }

    /// Deletes the item whose key attributes match those of `item`.
    pub async fn delete_item(&self, table: &Table, item: &Item) -> Result<()> {
        let result = match item.key(table.name(), table.key_schema()) {
            Ok(key) => {
                self.backend
                    .batch_write(table, vec![WriteRequest::Delete(key)])
                    .await
            }
            Err(err) => Err(err),
        };
        self.report(Operation::DeleteItem, table.name(), result, |_| {
            format!("deleted item {}", key_summary(table, item))
        })
    }

    /// Fetches the item identified by `primary_key`, `None` if there is none.
    pub async fn get_item(&self, table: &Table, primary_key: Item) -> Result<Option<Item>> {
        let summary = key_summary(table, &primary_key);
        let result = self.backend.get_item(table, primary_key).await;
        self.report(Operation::GetItem, table.name(), result, |item| match item {
            Some(_) => format!("found item {summary}"),
            None => format!("no item {summary}"),
        })
    }

    /// Sets `attribute` of the item identified by `primary_key` to `new_value`.
    ///
    /// Like the service, this creates the item when no item has that key.
    pub async fn update_item(
        &self,
        table: &Table,
        primary_key: Item,
        attribute: &str,
        new_value: AttributeValue,
    ) -> Result<()> {
        let summary = key_summary(table, &primary_key);
        let update = Update::new(attribute, new_value);
        let result = self.backend.update_item(table, primary_key, &update).await;
        self.report(Operation::UpdateItem, table.name(), result, |_| {
            format!("updated attribute '{attribute}' of item {summary}")
        })
    }

    // --- Scan and Query Operations ---

    /// Reads a single scan page starting after `exclusive_start_key`.
    pub async fn scan_page(&self, table: &Table, exclusive_start_key: Option<Item>) -> Result<Page> {
        let result = self.backend.scan(table, exclusive_start_key).await;
        self.report(Operation::Scan, table.name(), result, |page| {
            format!("scanned page of {} item(s)", page.items.len())
        })
    }

    /// Lazily scans every item of `table`, one page per request, until the
    /// service reports no continuation key.
    pub fn scan_items<'a>(&'a self, table: &'a Table) -> impl Stream<Item = Result<Item>> + 'a {
        self.paginate(table, Operation::Scan, None)
    }

    /// Scans the whole table and collects every item.
    pub async fn get_all_items(&self, table: &Table) -> Result<Vec<Item>> {
        self.scan_items(table).try_collect().await
    }

    /// Lazily reads the items whose partition key equals `partition_value`.
    pub fn query_items<'a>(
        &'a self,
        table: &'a Table,
        partition_value: AttributeValue,
    ) -> impl Stream<Item = Result<Item>> + 'a {
        self.paginate(table, Operation::Query, Some(partition_value))
    }

    fn paginate<'a>(
        &'a self,
        table: &'a Table,
        operation: Operation,
        partition_value: Option<AttributeValue>,
    ) -> impl Stream<Item = Result<Item>> + 'a {
        try_stream! {
            let mut exclusive_start_key = None;
            let mut pages = 0usize;
            let mut count = 0usize;
            loop {
                let page = self
                    .read_page(table, operation, partition_value.as_ref(), exclusive_start_key.take())
                    .await?;
                pages += 1;
                count += page.items.len();
                for item in page.items {
                    yield item;
                }
                match page.last_evaluated_key {
                    Some(key) => exclusive_start_key = Some(key),
                    None => break,
                }
            }
            self.observer.succeeded(
                operation,
                table.name(),
                &format!("read {count} item(s) in {pages} page(s)"),
            );
        }
    }

    async fn read_page(
        &self,
        table: &Table,
        operation: Operation,
        partition_value: Option<&AttributeValue>,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page> {
        let result = match partition_value {
            Some(value) => self.backend.query(table, value, exclusive_start_key).await,
            None => self.backend.scan(table, exclusive_start_key).await,
        };
        if let Err(err) = &result {
            self.observer.failed(operation, table.name(), err);
        }
        result
    }
}

/// Renders the key attributes of `item` for log lines.
fn key_summary(table: &Table, item: &Item) -> String {
    let parts: Vec<String> = table
        .key_schema()
        .names()
        .map(|name| match item.get(name) {
            Some(value) => format!("{name}={value:?}"),
            None => format!("{name}=<missing>"),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}
