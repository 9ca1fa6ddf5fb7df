use anyhow::{anyhow, Result};
use aws_dynamodb_client::{Backend, DynamoDb, Item, Table};
use aws_sdk_dynamodb::types::AttributeValue;
use futures_util::{pin_mut, TryStreamExt};
use std::io::{self, Write};

/// Runs the command-line interface for interacting with a DynamoDB table.
///
/// This function enters a loop that prompts the user for commands and executes them.
/// The supported commands are:
/// - info: Print table information
/// - put: Add a new item to the table
/// - get: Retrieve an item from the table
/// - update: Update one attribute of an item
/// - delete: Delete an item from the table
/// - scan: Scan the table page by page
/// - list: List all items in the table
/// - query: List the items of one partition
/// - exit: Exit the program
///
/// Operation failures are printed and the loop continues; only I/O errors on
/// the terminal end it.
pub async fn run<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    loop {
        let command = prompt(
            "Enter command (info/put/get/update/delete/scan/list/query/exit)",
            None,
        )?;
        let result = match command.as_str() {
            "info" => print_info(ddb, table).await,
            "put" => put_item(ddb, table).await,
            "get" => get_item(ddb, table).await,
            "update" => update_item(ddb, table).await,
            "delete" => delete_item(ddb, table).await,
            "scan" => scan_items(ddb, table).await,
            "list" => list_items(ddb, table).await,
            "query" => query_items(ddb, table).await,
            "exit" => break,
            _ => {
                println!("Unknown command. Please try again.");
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("Error: {e:#}");
        }
    }
    Ok(())
}

/// Prints the table handle as last looked up, refreshed from the service.
async fn print_info<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    let table = ddb
        .table_exists(table.name())
        .await?
        .ok_or_else(|| anyhow!("Table '{}' is not reachable", table.name()))?;

    println!("\n--- Table Information ---");
    println!("Table Name: {}", table.name());
    println!("Partition Key: {}", table.partition_key());
    if let Some(key) = table.sort_key() {
        println!("Sort Key: {}", key);
    }
    println!("Attribute Definitions:");
    for field in table.schema().fields() {
        println!("  {}: {:?}", field.name(), field.attribute_type());
    }
    if let Some(status) = table.status() {
        println!("Table Status: {}", status);
    }
    if let Some(created) = table.creation_date_time() {
        println!("Created: {:?}", created);
    }
    println!("-------------------------\n");
    Ok(())
}

/// Adds a new item: the key attributes, then any number of extra attributes.
async fn put_item<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    let mut item = create_key_item(table)?;
    loop {
        let name = prompt("Enter attribute name (or press Enter to finish)", None)?;
        if name.is_empty() {
            break;
        }
        item = item.set(name, prompt_value()?);
    }

    ddb.add_item(table, item).await?;
    println!("Item added successfully!");
    Ok(())
}

async fn get_item<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    let key = create_key_item(table)?;
    match ddb.get_item(table, key).await? {
        Some(item) => println!("Item found: {:?}", item.attributes()),
        None => println!("Item not found"),
    }
    Ok(())
}

async fn update_item<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    let key = create_key_item(table)?;
    let attribute = prompt("Enter attribute to update", Some("price"))?;
    if attribute.is_empty() {
        return Err(anyhow!("Attribute name must not be empty"));
    }
    let value = prompt_value()?;
    ddb.update_item(table, key, &attribute, value).await?;
    println!("Item updated successfully!");
    Ok(())
}

async fn delete_item<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    let key = create_key_item(table)?;
    ddb.delete_item(table, &key).await?;
    println!("Item deleted successfully!");
    Ok(())
}

/// Scans the table one page at a time, asking before each further page.
async fn scan_items<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    let mut exclusive_start_key = None;
    let mut page_num = 1;

    loop {
        let page = ddb.scan_page(table, exclusive_start_key.take()).await?;
        print_items(&format!("Scan Results (Page {})", page_num), &page.items);

        let Some(key) = page.last_evaluated_key else {
            break;
        };
        let continue_scan = prompt("Continue to next page? (y/n)", Some("y"))?;
        if !continue_scan.to_lowercase().starts_with('y') {
            break;
        }
        exclusive_start_key = Some(key);
        page_num += 1;
    }
    Ok(())
}

async fn list_items<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    let items = ddb.get_all_items(table).await?;
    print_items("All Items", &items);
    println!("Item Count: {}", items.len());
    Ok(())
}

/// Streams the items of one partition as they arrive.
async fn query_items<B: Backend>(ddb: &DynamoDb<B>, table: &Table) -> Result<()> {
    let value = prompt(&format!("Enter {} value", table.partition_key()), None)?;
    let items = ddb.query_items(table, AttributeValue::S(value));
    pin_mut!(items);

    let title = "Query Results";
    println!("\n--- {} ---", title);
    let mut count = 0;
    while let Some(item) = items.try_next().await? {
        println!("{:?}", item.attributes());
        count += 1;
    }
    println!("{} item(s)", count);
    println!("{}", "-".repeat(title.len() + 8));
    Ok(())
}

/// Prompts for the partition key and, when present, the sort key.
///
/// Key attributes are read as strings, matching the attribute definitions
/// the binary creates its table with.
fn create_key_item(table: &Table) -> Result<Item> {
    let mut key = Item::new();
    for name in table.key_schema().names() {
        key = key.set_string(name, prompt(&format!("Enter {}", name), None)?);
    }
    Ok(key)
}

fn prompt_value() -> Result<AttributeValue> {
    let value_type = prompt("Enter value type (S, N or BOOL)", Some("S"))?;
    let value = prompt("Enter value", Some("example_value"))?;
    match value_type.to_uppercase().as_str() {
        "" | "S" => Ok(AttributeValue::S(value)),
        "N" => {
            value.parse::<f64>()?;
            Ok(AttributeValue::N(value))
        }
        "BOOL" => Ok(AttributeValue::Bool(value.parse()?)),
        other => Err(anyhow!("Unsupported value type '{other}'")),
    }
}

fn print_items(title: &str, items: &[Item]) {
    println!("\n--- {} ---", title);
    items.iter().for_each(|item| println!("{:?}", item.attributes()));
    println!("{}", "-".repeat(title.len() + 8));
}

fn prompt(message: &str, example: Option<&str>) -> Result<String> {
    let full_message = if let Some(ex) = example {
        format!("{} (e.g., {}): ", message, ex)
    } else {
        format!("{}: ", message)
    };
    print!("{}", full_message);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
