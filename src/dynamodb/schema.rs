use aws_sdk_dynamodb::types::AttributeValue;

use crate::dynamodb::{Error, Result};

/// Role of a key attribute within a table's primary key.
///
/// - **Partition** (`HASH`): determines the partition an item is stored in.
/// - **Sort** (`RANGE`): orders items sharing the same partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Partition,
    Sort,
}

/// One entry of a [`KeySchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyElement {
    name: String,
    role: KeyRole,
}

impl KeyElement {
    pub fn new(name: impl Into<String>, role: KeyRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }
}

/// Ordered key schema of a table.
///
/// A key schema is either simple (partition key only) or composite
/// (partition key followed by a sort key). It is fixed when the table is
/// created.
///
/// # Example
///
/// ```
/// use aws_dynamodb_client::KeySchema;
///
/// let key_schema = KeySchema::new("user_id").with_sort_key("timestamp");
/// assert_eq!(key_schema.partition_key(), "user_id");
/// assert_eq!(key_schema.sort_key(), Some("timestamp"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    elements: Vec<KeyElement>,
}

impl KeySchema {
    /// Creates a simple key schema with only a partition key.
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            elements: vec![KeyElement::new(partition_key, KeyRole::Partition)],
        }
    }

    /// Adds (or replaces) the sort key.
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.elements.truncate(1);
        self.elements.push(KeyElement::new(sort_key, KeyRole::Sort));
        self
    }

    /// Builds a key schema from caller-supplied elements.
    ///
    /// The elements must hold exactly one partition key, listed first, and at
    /// most one sort key.
    pub fn from_elements(elements: Vec<KeyElement>) -> Result<Self> {
        match elements.as_slice() {
            [p] if p.role == KeyRole::Partition => {}
            [p, s] if p.role == KeyRole::Partition && s.role == KeyRole::Sort => {}
            [] => return Err(Error::InvalidKeySchema("no key attributes".to_string())),
            _ => {
                return Err(Error::InvalidKeySchema(
                    "expected a partition key optionally followed by one sort key".to_string(),
                ))
            }
        }
        Ok(Self { elements })
    }

    pub fn elements(&self) -> &[KeyElement] {
        &self.elements
    }

    pub fn partition_key(&self) -> &str {
        &self.elements[0].name
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.elements
            .get(1)
            .map(|element| element.name.as_str())
    }

    /// Names of the key attributes, partition key first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|element| element.name.as_str())
    }
}

/// Type of an indexed attribute.
///
/// Key attributes are limited to the scalar types below. Non-key attributes
/// need no definition: items are schemaless beyond their key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// `S`
    String,
    /// `N`
    Number,
    /// `B`
    Binary,
}

impl AttributeType {
    /// Returns `true` if `value` is of this type.
    pub fn matches(&self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (AttributeType::String, AttributeValue::S(_))
                | (AttributeType::Number, AttributeValue::N(_))
                | (AttributeType::Binary, AttributeValue::B(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    name: String,
    attribute_type: AttributeType,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }
}

/// Attribute definitions describing a table's indexed attributes.
///
/// # Example
///
/// ```
/// use aws_dynamodb_client::{AttributeType, Schema};
///
/// let schema = Schema::new()
///     .add_field("user_id", AttributeType::String)
///     .add_field("timestamp", AttributeType::Number);
/// assert_eq!(schema.get("timestamp"), Some(AttributeType::Number));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<AttributeDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field definition, replacing an earlier one with the same name.
    pub fn add_field(mut self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        let definition = AttributeDefinition::new(name, attribute_type);
        match self.fields.iter_mut().find(|f| f.name == definition.name) {
            Some(existing) => *existing = definition,
            None => self.fields.push(definition),
        }
        self
    }

    pub fn fields(&self) -> &[AttributeDefinition] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<AttributeType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.attribute_type)
    }
}

impl FromIterator<AttributeDefinition> for Schema {
    fn from_iter<I: IntoIterator<Item = AttributeDefinition>>(iter: I) -> Self {
        iter.into_iter().fold(Schema::new(), |schema, definition| {
            schema.add_field(definition.name, definition.attribute_type)
        })
    }
}
