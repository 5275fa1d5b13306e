use clap::Parser;
use migration::{Migrator, MigratorTrait};

mod cli;
mod commands;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "spendbook={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database_url());
    let database = connect(&url).await?;

    let engine = engine::Engine::builder()
        .database(database)
        .tx_timeout(settings.engine.tx_timeout())
        .build()
        .await?;

    let ctx = commands::Context {
        engine,
        conflict_retries: settings.engine.conflict_retries,
        json: cli.json,
    };
    commands::run(&ctx, cli.command).await
}

async fn connect(
    url: &str,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    tracing::debug!(url, "connecting to database");
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
