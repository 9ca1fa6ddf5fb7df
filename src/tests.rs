//! Client tests.
//!
//! Most tests drive `DynamoDb` over `MemoryBackend` and need nothing running.
//! The `live_*` tests talk to a real DynamoDB instance and are ignored by
//! default.
//!
//! # Live Setup
//!
//! Set the following environment variables in your `.env` file:
//!
//! ```text
//! AWS_ACCESS_KEY_ID=your_access_key
//! AWS_SECRET_ACCESS_KEY=your_secret_key
//! AWS_REGION=your_preferred_region
//! ```
//!
//! For local testing with DynamoDB Local, you can use dummy values and set:
//!
//! ```text
//! AWS_ENDPOINT_URL=http://localhost:8000
//! ```
//!
//! Then run `cargo test -- --ignored`. These tests may incur AWS charges if run
//! against a real DynamoDB instance.

use crate::dynamodb::{
    AttributeType, DynamoDb, Error, Item, KeySchema, MemoryBackend, Observer, Operation, Schema,
    Table, Throughput,
};
use anyhow::Result;
use aws_sdk_dynamodb::types::AttributeValue;
use futures_util::{pin_mut, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

const TEST_TABLE_NAME: &str = "test-products";
const CATEGORY_PARTITION_KEY: &str = "category";
const PRODUCT_NAME_SORT_KEY: &str = "product_name";
const PRICE_ATTRIBUTE: &str = "price";

#[derive(Debug, Default)]
struct RecordingObserver {
    events: Mutex<Vec<(Operation, String, bool)>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<(Operation, String, bool)> {
        self.events.lock().unwrap().clone()
    }

    fn failures(&self, operation: Operation) -> usize {
        self.events()
            .iter()
            .filter(|(op, _, ok)| *op == operation && !ok)
            .count()
    }
}

impl Observer for RecordingObserver {
    fn succeeded(&self, operation: Operation, table: &str, _detail: &str) {
        self.events
            .lock()
            .unwrap()
            .push((operation, table.to_string(), true));
    }

    fn failed(&self, operation: Operation, table: &str, _error: &Error) {
        self.events
            .lock()
            .unwrap()
            .push((operation, table.to_string(), false));
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Product {
    category: String,
    product_name: String,
    price: f64,
}

fn key_schema() -> KeySchema {
    KeySchema::new(CATEGORY_PARTITION_KEY).with_sort_key(PRODUCT_NAME_SORT_KEY)
}

fn schema() -> Schema {
    Schema::new()
        .add_field(CATEGORY_PARTITION_KEY, AttributeType::String)
        .add_field(PRODUCT_NAME_SORT_KEY, AttributeType::String)
}

fn product(category: &str, name: &str, price: f64) -> Item {
    Item::new()
        .set_string(CATEGORY_PARTITION_KEY, category)
        .set_string(PRODUCT_NAME_SORT_KEY, name)
        .set_number(PRICE_ATTRIBUTE, price)
}

fn key(category: &str, name: &str) -> Item {
    Item::new()
        .set_string(CATEGORY_PARTITION_KEY, category)
        .set_string(PRODUCT_NAME_SORT_KEY, name)
}

async fn setup_test_table(ddb: &DynamoDb<MemoryBackend>) -> Result<Table> {
    Ok(ddb
        .create_table(TEST_TABLE_NAME, key_schema(), schema())
        .await?)
}

fn memory_client() -> DynamoDb<MemoryBackend> {
    DynamoDb::with_backend(MemoryBackend::new())
}

#[tokio::test]
async fn test_create_table_twice_returns_existing() -> Result<()> {
    let ddb = memory_client();

    let first = setup_test_table(&ddb).await?;
    let second = setup_test_table(&ddb).await?;

    assert_eq!(first, second);
    assert_eq!(ddb.backend().create_requests().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_create_table_uses_fixed_throughput() -> Result<()> {
    let ddb = memory_client();

    let table = setup_test_table(&ddb).await?;
    assert_eq!(table.name(), TEST_TABLE_NAME);
    assert_eq!(table.key_schema(), &key_schema());
    assert_eq!(table.status(), Some("ACTIVE"));

    let requests = ddb.backend().create_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].throughput.read_capacity_units, 5);
    assert_eq!(requests[0].throughput.write_capacity_units, 5);
    assert_eq!(requests[0].throughput, Throughput::FIXED);
    Ok(())
}

#[tokio::test]
async fn test_create_table_failure_is_wrapped() -> Result<()> {
    let observer = Arc::new(RecordingObserver::default());
    let ddb = memory_client().with_observer(observer.clone());

    // The sort key has no attribute definition, so creation is rejected.
    let err = ddb
        .create_table(
            TEST_TABLE_NAME,
            key_schema(),
            Schema::new().add_field(CATEGORY_PARTITION_KEY, AttributeType::String),
        )
        .await
        .unwrap_err();

    match err {
        Error::CreateTable { name, source } => {
            assert_eq!(name, TEST_TABLE_NAME);
            assert!(matches!(*source, Error::Service { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(observer.failures(Operation::CreateTable), 1);
    Ok(())
}

#[tokio::test]
async fn test_table_exists_on_missing_table() -> Result<()> {
    let ddb = memory_client();

    assert!(ddb.table_exists("no-such-table").await?.is_none());

    let table = setup_test_table(&ddb).await?;
    let found = ddb.table_exists(TEST_TABLE_NAME).await?;
    assert_eq!(found.as_ref(), Some(&table));
    assert!(found.is_some_and(|t| t.creation_date_time().is_some()));
    Ok(())
}

#[tokio::test]
async fn test_add_then_get_returns_item() -> Result<()> {
    let ddb = memory_client();
    let table = setup_test_table(&ddb).await?;

    let item = product("Electronics", "Smartphone", 599.99);
    ddb.add_item(&table, item.clone()).await?;

    let retrieved = ddb.get_item(&table, key("Electronics", "Smartphone")).await?;
    assert_eq!(retrieved, Some(item));
    assert_eq!(ddb.backend().write_batch_sizes().await, vec![1]);
    Ok(())
}

#[tokio::test]
async fn test_get_missing_item_is_none() -> Result<()> {
    let ddb = memory_client();
    let table = setup_test_table(&ddb).await?;

    assert!(ddb.get_item(&table, key("Books", "Dune")).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_delete_then_get_is_none() -> Result<()> {
    let ddb = memory_client();
    let table = setup_test_table(&ddb).await?;

    let item = product("Books", "The Rust Programming Language", 39.99);
    ddb.add_item(&table, item.clone()).await?;
    // Deleting by the full item uses only its key attributes.
    ddb.delete_item(&table, &item).await?;

    let retrieved = ddb
        .get_item(&table, key("Books", "The Rust Programming Language"))
        .await?;
    assert!(retrieved.is_none());
    Ok(())
}

#[tokio::test]
async fn test_delete_without_key_attribute_fails() -> Result<()> {
    let observer = Arc::new(RecordingObserver::default());
    let ddb = memory_client().with_observer(observer.clone());
    let table = setup_test_table(&ddb).await?;

    let partial = Item::new().set_string(CATEGORY_PARTITION_KEY, "Books");
    let err = ddb.delete_item(&table, &partial).await.unwrap_err();

    assert!(matches!(
        err,
        Error::MissingKeyAttribute { ref attribute, .. } if attribute == PRODUCT_NAME_SORT_KEY
    ));
    assert_eq!(observer.failures(Operation::DeleteItem), 1);
    Ok(())
}

#[tokio::test]
async fn test_update_changes_only_named_attribute() -> Result<()> {
    let ddb = memory_client();
    let table = setup_test_table(&ddb).await?;

    let item = product("Electronics", "Laptop", 1200.0).set_string("color", "silver");
    ddb.add_item(&table, item.clone()).await?;

    ddb.update_item(
        &table,
        key("Electronics", "Laptop"),
        PRICE_ATTRIBUTE,
        AttributeValue::N("999.5".to_string()),
    )
    .await?;

    let updated = ddb
        .get_item(&table, key("Electronics", "Laptop"))
        .await?
        .expect("item should exist");
    assert_eq!(updated.get_number(PRICE_ATTRIBUTE), Some(999.5));
    assert_eq!(updated.len(), item.len());
    for (name, value) in item.attributes() {
        if name != PRICE_ATTRIBUTE {
            assert_eq!(updated.get(name), Some(value), "attribute {name} changed");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_operations_on_missing_table_fail() -> Result<()> {
    let observer = Arc::new(RecordingObserver::default());
    let ddb = memory_client().with_observer(observer.clone());
    let table = Table::new("missing", key_schema());

    let err = ddb
        .add_item(&table, product("Books", "Dune", 9.0))
        .await
        .unwrap_err();
    assert!(err.is_table_not_found());

    let err = ddb.get_item(&table, key("Books", "Dune")).await.unwrap_err();
    assert!(err.is_table_not_found());

    let err = ddb.get_all_items(&table).await.unwrap_err();
    assert!(err.is_table_not_found());

    assert_eq!(observer.failures(Operation::AddItem), 1);
    assert_eq!(observer.failures(Operation::GetItem), 1);
    assert_eq!(observer.failures(Operation::Scan), 1);
    Ok(())
}

#[tokio::test]
async fn test_scan_returns_every_page() -> Result<()> {
    let ddb = DynamoDb::with_backend(MemoryBackend::new().with_page_size(3));
    let table = setup_test_table(&ddb).await?;

    for i in 1..=10 {
        let item = product(&format!("Category{}", i), &format!("Product{}", i), i as f64);
        ddb.add_item(&table, item).await?;
    }

    assert_eq!(ddb.backend().item_count(TEST_TABLE_NAME).await, Some(10));

    let first_page = ddb.scan_page(&table, None).await?;
    assert_eq!(first_page.items.len(), 3);
    assert!(first_page.last_evaluated_key.is_some());

    let items = ddb.get_all_items(&table).await?;
    assert_eq!(items.len(), 10);
    let mut names: Vec<_> = items
        .iter()
        .filter_map(|item| item.get_string(PRODUCT_NAME_SORT_KEY).cloned())
        .collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 10);
    Ok(())
}

#[tokio::test]
async fn test_scan_stream_is_lazy() -> Result<()> {
    let observer = Arc::new(RecordingObserver::default());
    let ddb = DynamoDb::with_backend(MemoryBackend::new().with_page_size(2))
        .with_observer(observer.clone());
    let table = setup_test_table(&ddb).await?;

    for i in 1..=5 {
        ddb.add_item(&table, product("Toys", &format!("Toy{}", i), 5.0))
            .await?;
    }

    let stream = ddb.scan_items(&table);
    pin_mut!(stream);
    let first_two: Vec<Item> = stream.as_mut().take(2).try_collect().await?;
    assert_eq!(first_two.len(), 2);
    // Only one page has been read, so the scan has not reported completion.
    assert!(!observer
        .events()
        .iter()
        .any(|(op, _, _)| *op == Operation::Scan));

    let rest: Vec<Item> = stream.try_collect().await?;
    assert_eq!(rest.len(), 3);
    assert!(observer
        .events()
        .contains(&(Operation::Scan, TEST_TABLE_NAME.to_string(), true)));
    Ok(())
}

#[tokio::test]
async fn test_query_items_by_partition() -> Result<()> {
    let ddb = DynamoDb::with_backend(MemoryBackend::new().with_page_size(2));
    let table = setup_test_table(&ddb).await?;

    for i in 1..=5 {
        ddb.add_item(&table, product("Electronics", &format!("Product{}", i), i as f64 * 100.0))
            .await?;
        ddb.add_item(&table, product("Books", &format!("Book{}", i), i as f64))
            .await?;
    }

    let items: Vec<Item> = ddb
        .query_items(&table, AttributeValue::S("Electronics".to_string()))
        .try_collect()
        .await?;
    assert_eq!(items.len(), 5);
    assert!(items
        .iter()
        .all(|item| item.get_string(CATEGORY_PARTITION_KEY) == Some(&"Electronics".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_typed_items_round_trip_through_table() -> Result<()> {
    let ddb = memory_client();
    let table = setup_test_table(&ddb).await?;

    let smartphone = Product {
        category: "Electronics".to_string(),
        product_name: "Smartphone".to_string(),
        price: 599.99,
    };
    ddb.add_item(&table, Item::from_serde(&smartphone)?).await?;

    let stored = ddb
        .get_item(&table, key("Electronics", "Smartphone"))
        .await?
        .expect("item should exist");
    assert_eq!(stored.to_serde::<Product>()?, smartphone);
    Ok(())
}

#[tokio::test]
async fn test_observer_sees_every_success() -> Result<()> {
    let observer = Arc::new(RecordingObserver::default());
    let ddb = memory_client().with_observer(observer.clone());
    let table = setup_test_table(&ddb).await?;

    ddb.add_item(&table, product("Books", "Dune", 9.0)).await?;
    ddb.get_item(&table, key("Books", "Dune")).await?;
    ddb.update_item(
        &table,
        key("Books", "Dune"),
        PRICE_ATTRIBUTE,
        AttributeValue::N("10".to_string()),
    )
    .await?;
    ddb.delete_item(&table, &key("Books", "Dune")).await?;

    let operations: Vec<Operation> = observer
        .events()
        .into_iter()
        .filter(|(_, _, ok)| *ok)
        .map(|(op, _, _)| op)
        .collect();
    assert_eq!(
        operations,
        vec![
            Operation::TableExists,
            Operation::CreateTable,
            Operation::AddItem,
            Operation::GetItem,
            Operation::UpdateItem,
            Operation::DeleteItem,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_wait_for_active_returns_active_table() -> Result<()> {
    let ddb = memory_client();
    let created = setup_test_table(&ddb).await?;

    let table = ddb
        .wait_for_active(TEST_TABLE_NAME, Duration::from_millis(1), 3)
        .await?;
    assert_eq!(table, created);
    assert_eq!(table.status(), Some("ACTIVE"));
    Ok(())
}

#[tokio::test]
async fn test_wait_for_active_gives_up_on_missing_table() {
    let observer = Arc::new(RecordingObserver::default());
    let ddb = memory_client().with_observer(observer.clone());

    let err = ddb
        .wait_for_active("no-such-table", Duration::from_millis(1), 3)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::TableNotActive { ref name, status: None } if name == "no-such-table"
    ));
    let lookups = observer
        .events()
        .iter()
        .filter(|(op, _, _)| *op == Operation::TableExists)
        .count();
    assert_eq!(lookups, 3);
}

#[tokio::test]
async fn test_connect_rejects_unknown_service() {
    let err = DynamoDb::connect("s3").await.unwrap_err();
    assert!(matches!(err, Error::UnknownService(ref service) if service == "s3"));
}

// --- Live tests ---

async fn live_client() -> DynamoDb {
    dotenv::dotenv().ok();
    let sdk_config = aws_config::load_from_env().await;
    DynamoDb::new(&sdk_config)
}

#[tokio::test]
#[ignore = "requires DynamoDB or DynamoDB Local"]
async fn live_dynamodb_operations() -> Result<()> {
    info!("Starting live_dynamodb_operations");
    let ddb = live_client().await;

    ddb.create_table(TEST_TABLE_NAME, key_schema(), schema())
        .await?;
    // A freshly created table is CREATING and rejects writes until active.
    let table = ddb
        .wait_for_active(TEST_TABLE_NAME, Duration::from_secs(2), 30)
        .await?;
    info!("Table status: {:?}", table.status());
    assert_eq!(table.status(), Some("ACTIVE"));

    let item = product("Electronics", "Smartphone", 599.99);
    ddb.add_item(&table, item).await?;

    let retrieved = ddb
        .get_item(&table, key("Electronics", "Smartphone"))
        .await?
        .expect("item should exist");
    assert_eq!(retrieved.get_number(PRICE_ATTRIBUTE), Some(599.99));

    ddb.update_item(
        &table,
        key("Electronics", "Smartphone"),
        PRICE_ATTRIBUTE,
        AttributeValue::N("649.99".to_string()),
    )
    .await?;
    let retrieved = ddb
        .get_item(&table, key("Electronics", "Smartphone"))
        .await?
        .expect("item should exist");
    assert_eq!(retrieved.get_number(PRICE_ATTRIBUTE), Some(649.99));

    let partition: Vec<Item> = ddb
        .query_items(&table, AttributeValue::S("Electronics".to_string()))
        .try_collect()
        .await?;
    assert!(!partition.is_empty());

    ddb.delete_item(&table, &retrieved).await?;
    assert!(ddb
        .get_item(&table, key("Electronics", "Smartphone"))
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires DynamoDB or DynamoDB Local"]
async fn live_table_exists_on_missing_table() -> Result<()> {
    let ddb = live_client().await;
    assert!(ddb
        .table_exists("aws-dynamodb-client-missing-table")
        .await?
        .is_none());
    Ok(())
}
