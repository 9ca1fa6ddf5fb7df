//! In-process backend for tests and offline runs.
//!
//! Tables live in a `BTreeMap` keyed by the typed primary key, wrapped in
//! `Arc<RwLock<_>>`. Numbers in keys compare by value, so `1` and `1.0` name
//! the same item. The backend mimics the service where it matters to
//! callers: missing tables, key validation, upserting updates and paginated
//! reads with a fixed page size. Nothing is persisted.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use aws_sdk_dynamodb::{primitives::DateTime, types::AttributeValue};
use tokio::sync::RwLock;

use crate::dynamodb::{
    Backend, CreateTableRequest, Error, Item, Operation, Page, Result, Table, Update, WriteRequest,
};

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
    page_size: usize,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, StoredTable>,
    create_requests: Vec<CreateTableRequest>,
    write_batches: Vec<usize>,
}

/// One scalar of a primary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Number(BigDecimal),
    String(String),
    Binary(Vec<u8>),
}

/// Key parts in key schema order: partition key first.
type StorageKey = Vec<KeyPart>;

#[derive(Debug)]
struct StoredTable {
    table: Table,
    items: BTreeMap<StorageKey, Item>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets how many items a single scan or query page holds.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every create-table request received so far, including rejected ones.
    pub async fn create_requests(&self) -> Vec<CreateTableRequest> {
        self.state.read().await.create_requests.clone()
    }

    /// Number of write requests carried by each batch write received so far.
    pub async fn write_batch_sizes(&self) -> Vec<usize> {
        self.state.read().await.write_batches.clone()
    }

    pub async fn item_count(&self, table_name: &str) -> Option<usize> {
        self.state
            .read()
            .await
            .tables
            .get(table_name)
            .map(|stored| stored.items.len())
    }
}

fn validation(operation: Operation, message: impl std::fmt::Display) -> Error {
    Error::Service {
        operation,
        message: format!("ValidationException: {message}"),
    }
}

fn key_part(operation: Operation, name: &str, value: &AttributeValue) -> Result<KeyPart> {
    match value {
        AttributeValue::S(s) => Ok(KeyPart::String(s.clone())),
        AttributeValue::N(n) => BigDecimal::from_str(n)
            .map(|number| KeyPart::Number(number.normalized()))
            .map_err(|_| {
                validation(
                    operation,
                    format!("key attribute '{name}' is not a valid number: {n}"),
                )
            }),
        AttributeValue::B(b) => Ok(KeyPart::Binary(b.as_ref().to_vec())),
        _ => Err(validation(
            operation,
            format!("key attribute '{name}' must be a scalar"),
        )),
    }
}

impl StoredTable {
    /// Builds the storage key of `item`, checking presence and type of every
    /// key attribute.
    fn key_of(&self, operation: Operation, item: &Item) -> Result<StorageKey> {
        let mut parts = Vec::with_capacity(2);
        for name in self.table.key_schema().names() {
            let value = item.get(name).ok_or_else(|| Error::MissingKeyAttribute {
                table: self.table.name().to_string(),
                attribute: name.to_string(),
            })?;
            if let Some(attribute_type) = self.table.schema().get(name) {
                if !attribute_type.matches(value) {
                    return Err(validation(
                        operation,
                        format!("key attribute '{name}' must be of type {attribute_type:?}"),
                    ));
                }
            }
            parts.push(key_part(operation, name, value)?);
        }
        Ok(parts)
    }

    /// Like [`StoredTable::key_of`] but rejects non-key attributes.
    fn exact_key_of(&self, operation: Operation, key: &Item) -> Result<StorageKey> {
        if key.len() != self.table.key_schema().elements().len() {
            return Err(validation(
                operation,
                "the provided key element does not match the schema",
            ));
        }
        self.key_of(operation, key)
    }

    fn page(
        &self,
        operation: Operation,
        exclusive_start_key: Option<Item>,
        page_size: usize,
        matches: impl Fn(&Item) -> bool,
    ) -> Result<Page> {
        let lower = match &exclusive_start_key {
            Some(key) => Bound::Excluded(self.key_of(operation, key)?),
            None => Bound::Unbounded,
        };

        let mut matching = self
            .items
            .range((lower, Bound::Unbounded))
            .map(|(_, item)| item)
            .filter(|item| matches(item));
        let items: Vec<Item> = matching.by_ref().take(page_size).cloned().collect();

        let last_evaluated_key = match (matching.next(), items.last()) {
            (Some(_), Some(last)) => Some(last.key(self.table.name(), self.table.key_schema())?),
            _ => None,
        };

        Ok(Page {
            items,
            last_evaluated_key,
        })
    }
}

impl State {
    fn table(&self, name: &str) -> Result<&StoredTable> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut StoredTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn describe_table(&self, name: &str) -> Result<Option<Table>> {
        let state = self.state.read().await;
        Ok(state.tables.get(name).map(|stored| stored.table.clone()))
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<Table> {
        let mut state = self.state.write().await;
        state.create_requests.push(request.clone());

        if state.tables.contains_key(&request.name) {
            return Err(Error::Service {
                operation: Operation::CreateTable,
                message: format!("ResourceInUseException: Table already exists: {}", request.name),
            });
        }
        if let Some(missing) = request
            .key_schema
            .names()
            .find(|name| request.schema.get(name).is_none())
        {
            return Err(validation(
                Operation::CreateTable,
                format!("key attribute '{missing}' has no attribute definition"),
            ));
        }

        let table = Table::new(&request.name, request.key_schema.clone())
            .with_schema(request.schema.clone())
            .with_status("ACTIVE")
            .with_creation_date_time(DateTime::from(SystemTime::now()));
        state.tables.insert(
            request.name.clone(),
            StoredTable {
                table: table.clone(),
                items: BTreeMap::new(),
            },
        );
        Ok(table)
    }

    async fn batch_write(&self, table: &Table, requests: Vec<WriteRequest>) -> Result<()> {
        let mut state = self.state.write().await;
        state.write_batches.push(requests.len());
        let stored = state.table_mut(table.name())?;

        for request in requests {
            match request {
                WriteRequest::Put(item) => {
                    let key = stored.key_of(Operation::AddItem, &item)?;
                    stored.items.insert(key, item);
                }
                WriteRequest::Delete(key) => {
                    let key = stored.exact_key_of(Operation::DeleteItem, &key)?;
                    stored.items.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn get_item(&self, table: &Table, key: Item) -> Result<Option<Item>> {
        let state = self.state.read().await;
        let stored = state.table(table.name())?;
        let key = stored.exact_key_of(Operation::GetItem, &key)?;
        Ok(stored.items.get(&key).cloned())
    }

    async fn update_item(&self, table: &Table, key: Item, update: &Update) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state.table_mut(table.name())?;

        if stored
            .table
            .key_schema()
            .names()
            .any(|name| name == update.attribute)
        {
            return Err(validation(
                Operation::UpdateItem,
                format!(
                    "cannot update attribute '{}', it is part of the key",
                    update.attribute
                ),
            ));
        }

        let storage_key = stored.exact_key_of(Operation::UpdateItem, &key)?;
        let item = stored.items.entry(storage_key).or_insert(key);
        item.attributes
            .insert(update.attribute.clone(), update.value.clone());
        Ok(())
    }

    async fn scan(&self, table: &Table, exclusive_start_key: Option<Item>) -> Result<Page> {
        let state = self.state.read().await;
        state
            .table(table.name())?
            .page(Operation::Scan, exclusive_start_key, self.page_size, |_| true)
    }

    async fn query(
        &self,
        table: &Table,
        partition_value: &AttributeValue,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page> {
        let state = self.state.read().await;
        let partition_key = table.partition_key();
        state.table(table.name())?.page(
            Operation::Query,
            exclusive_start_key,
            self.page_size,
            |item| item.get(partition_key) == Some(partition_value),
        )
    }
}
