pub use sea_orm_migration::prelude::*;

mod m20261016_000000_init;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261016_000000_init::Migration)]
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, Database, Statement};

    use super::*;

    #[tokio::test]
    async fn up_and_down_round_trip() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let manager = SchemaManager::new(&db);
        for table in [
            "users",
            "wallets",
            "wallet_owners",
            "wallet_balances",
            "categories",
            "flows",
        ] {
            assert!(manager.has_table(table).await.unwrap(), "{table} missing");
        }

        let backend = db.get_database_backend();
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, username, password) VALUES (?, ?, ?)",
            vec!["u1".into(), "alice".into(), "pw".into()],
        ))
        .await
        .unwrap();
        // Usernames are unique.
        assert!(
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO users (id, username, password) VALUES (?, ?, ?)",
                vec!["u2".into(), "alice".into(), "pw".into()],
            ))
            .await
            .is_err()
        );

        Migrator::down(&db, None).await.unwrap();
        assert!(!manager.has_table("flows").await.unwrap());
        assert!(!manager.has_table("users").await.unwrap());
    }
}
