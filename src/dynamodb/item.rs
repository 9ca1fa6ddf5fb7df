use aws_sdk_dynamodb::types::AttributeValue;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::dynamodb::{Error, KeySchema, Result};

/// A single record, stored as a map of attribute names to values.
///
/// # Item Structure
///
/// - Each item consists of one or more attributes.
/// - Each attribute has a name and a value.
/// - Attribute values can be of various types: String, Number, Binary, Boolean, Null, List, Map, etc.
///
/// # Primary Key
///
/// A primary key is an `Item` holding only the key attributes of its table,
/// see [`Item::key`].
///
/// # Example
///
/// ```
/// use aws_dynamodb_client::Item;
///
/// let item = Item::new()
///     .set_string("user_id", "12345")
///     .set_string("username", "johndoe")
///     .set_number("age", 30.0);
/// assert_eq!(item.get_number("age"), Some(30.0));
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) attributes: HashMap<String, AttributeValue>,
}

impl Item {
    /// Creates a new empty `Item`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute to an arbitrary value.
    pub fn set(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Sets a string attribute.
    pub fn set_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, AttributeValue::S(value.into()))
    }

    /// Sets a number attribute.
    ///
    /// Numbers travel as strings on the wire and are stored with high precision.
    pub fn set_number(self, key: impl Into<String>, value: impl Into<f64>) -> Self {
        self.set(key, AttributeValue::N(value.into().to_string()))
    }

    pub fn set_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.set(key, AttributeValue::Bool(value))
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Gets the value of an attribute as a string.
    ///
    /// Returns `None` if the attribute doesn't exist or is not a string.
    pub fn get_string(&self, key: &str) -> Option<&String> {
        self.attributes.get(key).and_then(|av| av.as_s().ok())
    }

    /// Gets the value of an attribute as a number (f64).
    ///
    /// Returns `None` if the attribute doesn't exist, is not a number, or can't be parsed as f64.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(|av| av.as_bool().ok()).copied()
    }

    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn into_attributes(self) -> HashMap<String, AttributeValue> {
        self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Extracts the primary key of this item for a table with `key_schema`.
    ///
    /// Fails with [`Error::MissingKeyAttribute`] when a key attribute is absent.
    pub fn key(&self, table_name: &str, key_schema: &KeySchema) -> Result<Item> {
        key_schema
            .names()
            .map(|name| {
                self.attributes
                    .get(name)
                    .map(|value| (name.to_string(), value.clone()))
                    .ok_or_else(|| Error::MissingKeyAttribute {
                        table: table_name.to_string(),
                        attribute: name.to_string(),
                    })
            })
            .collect::<Result<HashMap<_, _>>>()
            .map(Item::from)
    }

    /// Converts any serializable value into an item.
    pub fn from_serde<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let attributes: HashMap<String, AttributeValue> = serde_dynamo::to_item(value)?;
        Ok(Self { attributes })
    }

    /// Converts this item into a deserializable value.
    pub fn to_serde<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_dynamo::from_item(self.attributes.clone())?)
    }
}

impl From<HashMap<String, AttributeValue>> for Item {
    fn from(attributes: HashMap<String, AttributeValue>) -> Self {
        Self { attributes }
    }
}

impl From<Item> for HashMap<String, AttributeValue> {
    fn from(item: Item) -> Self {
        item.attributes
    }
}
