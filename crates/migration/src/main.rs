use sea_orm::Database;
use sea_orm_migration::prelude::*;

/// Environment form of the app's `server.database = { sqlite = "..." }`.
const SQLITE_PATH_VAR: &str = "FAMONEY__SERVER__DATABASE__SQLITE";

/// `DATABASE_URL` wins, then the sqlite file the app is configured with.
fn database_url(url: Option<String>, sqlite_path: Option<String>) -> String {
    url.or_else(|| sqlite_path.map(|path| format!("sqlite:{path}?mode=rwc")))
        .unwrap_or_else(|| "sqlite:./famoney.db?mode=rwc".to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "up".to_string());

    let db_url = database_url(
        std::env::var("DATABASE_URL").ok(),
        std::env::var(SQLITE_PATH_VAR).ok(),
    );

    let db = Database::connect(&db_url).await?;

    match cmd.as_str() {
        "up" => migration::Migrator::up(&db, None).await?,
        "down" => migration::Migrator::down(&db, None).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => {
            migration::Migrator::status(&db).await?;
        }
        _ => {
            eprintln!("Usage: cargo run -p migration -- [up|down|fresh|status]");
            std::process::exit(2);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_prefers_explicit_url() {
        let url = database_url(Some("sqlite::memory:".to_string()), Some("a.db".to_string()));
        assert_eq!(url, "sqlite::memory:");
    }

    #[test]
    fn database_url_follows_app_sqlite_setting() {
        assert_eq!(
            database_url(None, Some("/var/lib/famoney.db".to_string())),
            "sqlite:/var/lib/famoney.db?mode=rwc"
        );
        assert_eq!(database_url(None, None), "sqlite:./famoney.db?mode=rwc");
    }
}
