//! # DynamoDB Module
//!
//! A small wrapper over the DynamoDB client SDK: table creation plus
//! put/delete/get/update/scan on items.
//!
//! ## Components
//!
//! - `DynamoDb`: the client; every operation returns an explicit `Result`.
//! - `Backend`: one remote request per call. `SdkBackend` uses the AWS SDK,
//!   `MemoryBackend` keeps tables in process.
//! - `Observer`: receives every operation outcome (`TracingObserver` by default).
//! - `Item`, `KeySchema`, `Schema`, `Table`: the data model.
//!
//! ## Usage
//!
//! `SdkBackend` reads the standard AWS variables:
//!
//! - `AWS_ACCESS_KEY_ID`: Your AWS access key ID.
//! - `AWS_SECRET_ACCESS_KEY`: Your AWS secret access key.
//! - `AWS_REGION`: The AWS region where your DynamoDB tables are located.
//!
//! Optionally, you can also set:
//! - `AWS_SESSION_TOKEN`: If you're using temporary credentials.
//! - `AWS_ENDPOINT_URL`: For using a custom endpoint (e.g., for local development).

mod backend;
mod client;
mod error;
mod item;
mod memory;
mod observer;
mod schema;
mod sdk;
mod table;

pub use backend::{Backend, CreateTableRequest, Page, Throughput, Update, WriteRequest};
pub use client::{DynamoDb, SERVICE};
pub use error::{Error, Result};
pub use item::Item;
pub use memory::MemoryBackend;
pub use observer::{Observer, Operation, TracingObserver};
pub use schema::{AttributeDefinition, AttributeType, KeyElement, KeyRole, KeySchema, Schema};
pub use sdk::SdkBackend;
pub use table::Table;
