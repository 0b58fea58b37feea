use std::{sync::Arc, time::Duration};

use clap::Parser;
use engine::{
    Currency, Engine, RateTable, Rates,
    store::{MemoryStore, SeaStore},
};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod rates;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "famoney")]
#[command(about = "Shared multi-currency wallets")]
struct Cli {
    /// Settings file, extension optional (also read from `FAMONEY_CONFIG`).
    #[arg(long, env = "FAMONEY_CONFIG", default_value = "settings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "famoney={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let reference: Currency = settings.rates.reference.parse()?;
    let default_base: Currency = settings.server.default_base.parse()?;
    let rates = Arc::new(Rates::new(RateTable::reference_only(reference)));

    match settings.rates.api_key.as_deref() {
        Some(api_key) => {
            tracing::info!(%reference, hours = settings.rates.refresh_hours, "Found rates settings...");
            let source = Arc::new(rates::ExchangeRateApi::new(api_key, reference));
            let every = refresh_interval(settings.rates.refresh_hours);
            tasks.spawn(engine::rates::run_refresher(rates.clone(), source, every));
        }
        None => tracing::warn!("no rates api key, only {reference} is known"),
    }

    let builder = Engine::builder()
        .rates(rates)
        .store_timeout(Duration::from_millis(settings.engine.store_timeout_ms));
    let engine = match &settings.server.database {
        Database::Memory => builder.store(MemoryStore::new()).build(),
        Database::Sqlite(path) => builder.store(SeaStore::new(parse_database(path).await?)).build(),
    };

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let state = server::ServerState::new(Arc::new(engine), default_base);
    tasks.spawn(async move {
        if let Err(err) = server::run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

/// Period of the rate refresher; at least one hour.
fn refresh_interval(hours: u64) -> Duration {
    Duration::from_secs(hours.max(1).saturating_mul(3600))
}

async fn parse_database(
    path: &str,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(format!("sqlite:{path}?mode=rwc")).await?;
    Migrator::up(&database, None).await?;
    tracing::info!(path, "database ready");
    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_interval_is_clamped() {
        assert_eq!(refresh_interval(0), Duration::from_secs(3600));
        assert_eq!(refresh_interval(12), Duration::from_secs(12 * 3600));
        assert_eq!(refresh_interval(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
