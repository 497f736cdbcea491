use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynatable::cli::{run, Cli};
use dynatable::storage::DynamoDbStore;
use dynatable::Config;
use dynatable_core::Table;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynatable=info,dynatable_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config(Config::from_env());
    tracing::info!("Using {}", config.target_display());

    let store = DynamoDbStore::from_config(&config).await;
    let table = Table::new(store, &config.table_name, config.key_schema());

    if let Some(output) = run(&table, cli.command).await? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
