use async_trait::async_trait;
use aws_sdk_dynamodb::{
    types::{self as sdk, AttributeValue, KeyType, ScalarAttributeType, TableDescription},
    Client,
};
use std::collections::HashMap;

use crate::dynamodb::{
    error::map_sdk_error, AttributeDefinition, AttributeType, Backend, CreateTableRequest, Error,
    Item, KeyElement, KeyRole, KeySchema, Operation, Page, Result, Schema, Table, Update,
    WriteRequest,
};

/// [`Backend`] backed by the AWS SDK DynamoDB client.
///
/// Region, credentials and endpoint come from the `SdkConfig` the backend is
/// built with. Set `AWS_ENDPOINT_URL` to point it at DynamoDB Local.
#[derive(Debug, Clone)]
pub struct SdkBackend {
    client: Client,
}

impl SdkBackend {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Backend for SdkBackend {
    async fn describe_table(&self, name: &str) -> Result<Option<Table>> {
        match self.client.describe_table().table_name(name).send().await {
            Ok(output) => output
                .table
                .map(|description| table_from_description(name, &description))
                .transpose(),
            Err(err) => match map_sdk_error(Operation::TableExists, name, err) {
                Error::TableNotFound(_) => Ok(None),
                err => Err(err),
            },
        }
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<Table> {
        let key_schema = request
            .key_schema
            .elements()
            .iter()
            .map(|element| {
                sdk::KeySchemaElement::builder()
                    .attribute_name(element.name())
                    .key_type(match element.role() {
                        KeyRole::Partition => KeyType::Hash,
                        KeyRole::Sort => KeyType::Range,
                    })
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let attribute_definitions = request
            .schema
            .fields()
            .iter()
            .map(|field| {
                sdk::AttributeDefinition::builder()
                    .attribute_name(field.name())
                    .attribute_type(scalar_type(field.attribute_type()))
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let throughput = sdk::ProvisionedThroughput::builder()
            .read_capacity_units(request.throughput.read_capacity_units)
            .write_capacity_units(request.throughput.write_capacity_units)
            .build()?;

        let output = self
            .client
            .create_table()
            .table_name(&request.name)
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .provisioned_throughput(throughput)
            .send()
            .await
            .map_err(|e| map_sdk_error(Operation::CreateTable, &request.name, e))?;

        match output.table_description {
            Some(description) => table_from_description(&request.name, &description),
            None => Ok(Table::new(&request.name, request.key_schema.clone())
                .with_schema(request.schema.clone())),
        }
    }

    async fn batch_write(&self, table: &Table, requests: Vec<WriteRequest>) -> Result<()> {
        let operation = batch_operation(&requests);
        let writes = requests
            .into_iter()
            .map(|request| match request {
                WriteRequest::Put(item) => sdk::PutRequest::builder()
                    .set_item(Some(item.attributes))
                    .build()
                    .map(|put| sdk::WriteRequest::builder().put_request(put).build()),
                WriteRequest::Delete(key) => sdk::DeleteRequest::builder()
                    .set_key(Some(key.attributes))
                    .build()
                    .map(|delete| sdk::WriteRequest::builder().delete_request(delete).build()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table.name(), writes)
            .send()
            .await
            .map_err(|e| map_sdk_error(operation, table.name(), e))?;

        let unprocessed = output
            .unprocessed_items()
            .and_then(|items| items.get(table.name()))
            .map_or(0, Vec::len);
        if unprocessed > 0 {
            return Err(Error::Service {
                operation,
                message: format!("{unprocessed} write request(s) left unprocessed"),
            });
        }
        Ok(())
    }

    async fn get_item(&self, table: &Table, key: Item) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(table.name())
            .set_key(Some(key.attributes))
            .send()
            .await
            .map_err(|e| map_sdk_error(Operation::GetItem, table.name(), e))?;

        Ok(output.item.map(Item::from))
    }

    async fn update_item(&self, table: &Table, key: Item, update: &Update) -> Result<()> {
        self.client
            .update_item()
            .table_name(table.name())
            .set_key(Some(key.attributes))
            .update_expression(update.expression())
            .expression_attribute_names(Update::NAME_PLACEHOLDER, &update.attribute)
            .expression_attribute_values(Update::VALUE_PLACEHOLDER, update.value.clone())
            .send()
            .await
            .map_err(|e| map_sdk_error(Operation::UpdateItem, table.name(), e))?;
        Ok(())
    }

    async fn scan(&self, table: &Table, exclusive_start_key: Option<Item>) -> Result<Page> {
        let output = self
            .client
            .scan()
            .table_name(table.name())
            .set_exclusive_start_key(exclusive_start_key.map(Item::into_attributes))
            .send()
            .await
            .map_err(|e| map_sdk_error(Operation::Scan, table.name(), e))?;

        Ok(page(output.items, output.last_evaluated_key))
    }

    async fn query(
        &self,
        table: &Table,
        partition_value: &AttributeValue,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page> {
        let output = self
            .client
            .query()
            .table_name(table.name())
            .key_condition_expression("#pk = :pkval")
            .expression_attribute_names("#pk", table.partition_key())
            .expression_attribute_values(":pkval", partition_value.clone())
            .set_exclusive_start_key(exclusive_start_key.map(Item::into_attributes))
            .send()
            .await
            .map_err(|e| map_sdk_error(Operation::Query, table.name(), e))?;

        Ok(page(output.items, output.last_evaluated_key))
    }
}

fn page(
    items: Option<Vec<HashMap<String, AttributeValue>>>,
    last_evaluated_key: Option<HashMap<String, AttributeValue>>,
) -> Page {
    Page {
        items: items
            .unwrap_or_default()
            .into_iter()
            .map(Item::from)
            .collect(),
        last_evaluated_key: last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(Item::from),
    }
}

fn batch_operation(requests: &[WriteRequest]) -> Operation {
    if requests.iter().all(|r| matches!(r, WriteRequest::Put(_))) {
        Operation::AddItem
    } else {
        Operation::DeleteItem
    }
}

fn scalar_type(attribute_type: AttributeType) -> ScalarAttributeType {
    match attribute_type {
        AttributeType::String => ScalarAttributeType::S,
        AttributeType::Number => ScalarAttributeType::N,
        AttributeType::Binary => ScalarAttributeType::B,
    }
}

fn table_from_description(name: &str, description: &TableDescription) -> Result<Table> {
    let elements = description
        .key_schema()
        .iter()
        .map(|element| {
            let role = match element.key_type() {
                KeyType::Hash => KeyRole::Partition,
                KeyType::Range => KeyRole::Sort,
                other => {
                    return Err(Error::InvalidKeySchema(format!(
                        "unsupported key type {other:?}"
                    )))
                }
            };
            Ok(KeyElement::new(element.attribute_name(), role))
        })
        .collect::<Result<Vec<_>>>()?;

    let schema = description
        .attribute_definitions()
        .iter()
        .map(|definition| {
            let attribute_type = match definition.attribute_type() {
                ScalarAttributeType::S => AttributeType::String,
                ScalarAttributeType::N => AttributeType::Number,
                ScalarAttributeType::B => AttributeType::Binary,
                other => {
                    return Err(Error::InvalidKeySchema(format!(
                        "unsupported attribute type {other:?}"
                    )))
                }
            };
            Ok(AttributeDefinition::new(
                definition.attribute_name(),
                attribute_type,
            ))
        })
        .collect::<Result<Schema>>()?;

    let mut table = Table::new(
        description.table_name().unwrap_or(name),
        KeySchema::from_elements(elements)?,
    )
    .with_schema(schema);

    if let Some(status) = description.table_status() {
        table = table.with_status(status.as_str());
    }
    if let Some(created) = description.creation_date_time() {
        table = table.with_creation_date_time(*created);
    }
    Ok(table)
}
