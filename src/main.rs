mod command_line;

use anyhow::Result;
use aws_dynamodb_client::{
    config::{BackendKind, Config},
    logging, Backend, DynamoDb, MemoryBackend,
};
use std::time::Duration;
use tracing::info;

const ACTIVE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const ACTIVE_POLL_ATTEMPTS: usize = 30;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init_logging(config.log_level)?;

    match config.backend {
        BackendKind::Aws => run(DynamoDb::connect(&config.service).await?, &config).await,
        BackendKind::Memory => {
            info!("Using in-memory backend, nothing will be persisted");
            run(DynamoDb::with_backend(MemoryBackend::new()), &config).await
        }
    }
}

async fn run<B: Backend>(ddb: DynamoDb<B>, config: &Config) -> Result<()> {
    ddb.create_table(&config.table_name, config.key_schema(), config.schema())
        .await?;
    let table = ddb
        .wait_for_active(&config.table_name, ACTIVE_POLL_INTERVAL, ACTIVE_POLL_ATTEMPTS)
        .await?;

    info!("Table name: {}", table.name());
    if let Some(status) = table.status() {
        info!("Table status: {}", status);
    }

    command_line::run(&ddb, &table).await
}
