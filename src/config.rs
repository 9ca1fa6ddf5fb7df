//! Runtime configuration read from the environment (and an optional `.env`).
//!
//! | Variable        | Default            |
//! |-----------------|--------------------|
//! | `DDB_SERVICE`   | `dynamodb`         |
//! | `DDB_BACKEND`   | `aws` (`memory`)   |
//! | `TABLE_NAME`    | `testing-products` |
//! | `PARTITION_KEY` | `category`         |
//! | `SORT_KEY`      | `product_name`, empty for none |
//! | `LOG_LEVEL`     | `info`             |
//!
//! Credentials, region and endpoint are left to the AWS SDK (`AWS_*`).

use anyhow::{anyhow, Context, Result};
use std::str::FromStr;
use tracing::Level;

use crate::dynamodb::{AttributeType, KeySchema, Schema, SERVICE};

const TABLE_NAME: &str = "testing-products";
const PARTITION_KEY: &str = "category";
const SORT_KEY: &str = "product_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// DynamoDB through the AWS SDK.
    Aws,
    /// Tables kept in process, lost on exit.
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(BackendKind::Aws),
            "memory" => Ok(BackendKind::Memory),
            other => Err(anyhow!("unknown backend '{other}', expected 'aws' or 'memory'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub service: String,
    pub backend: BackendKind,
    pub table_name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
    pub log_level: Level,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match lookup("DDB_BACKEND") {
            Some(value) => value.parse()?,
            None => BackendKind::Aws,
        };
        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => Level::from_str(&value)
                .with_context(|| format!("invalid LOG_LEVEL '{value}'"))?,
            None => Level::INFO,
        };
        let sort_key = match lookup("SORT_KEY") {
            Some(value) if value.is_empty() => None,
            Some(value) => Some(value),
            None => Some(SORT_KEY.to_string()),
        };

        Ok(Self {
            service: lookup("DDB_SERVICE").unwrap_or_else(|| SERVICE.to_string()),
            backend,
            table_name: lookup("TABLE_NAME").unwrap_or_else(|| TABLE_NAME.to_string()),
            partition_key: lookup("PARTITION_KEY").unwrap_or_else(|| PARTITION_KEY.to_string()),
            sort_key,
            log_level,
        })
    }

    pub fn key_schema(&self) -> KeySchema {
        let key_schema = KeySchema::new(&self.partition_key);
        match &self.sort_key {
            Some(sort_key) => key_schema.with_sort_key(sort_key),
            None => key_schema,
        }
    }

    /// Attribute definitions for the key attributes, all typed as strings.
    pub fn schema(&self) -> Schema {
        self.key_schema()
            .names()
            .fold(Schema::new(), |schema, name| {
                schema.add_field(name, AttributeType::String)
            })
    }
}
