//! Initial schema migration.
//!
//! - `users`: accounts, unique by username
//! - `wallets`: shared wallets
//! - `wallet_owners`: who may read and mutate a wallet
//! - `wallet_balances`: running balance per (wallet, currency)
//! - `categories`: global categories, unique by name
//! - `flows`: the flow journal
//!
//! Foreign keys never cascade: the engine deletes children first.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum WalletOwners {
    Table,
    WalletId,
    UserId,
}

#[derive(Iden)]
enum WalletBalances {
    Table,
    WalletId,
    Currency,
    BalanceMinor,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Flows {
    Table,
    Id,
    WalletId,
    AmountMinor,
    Currency,
    CategoryId,
    Description,
    CreatedAt,
    OperatorId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Wallets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Wallets::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletOwners::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WalletOwners::WalletId).string().not_null())
                    .col(ColumnDef::new(WalletOwners::UserId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(WalletOwners::WalletId)
                            .col(WalletOwners::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_owners-wallet_id")
                            .from(WalletOwners::Table, WalletOwners::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_owners-user_id")
                            .from(WalletOwners::Table, WalletOwners::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_owners-user_id")
                    .table(WalletOwners::Table)
                    .col(WalletOwners::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletBalances::WalletId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletBalances::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletBalances::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(WalletBalances::WalletId)
                            .col(WalletBalances::Currency),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_balances-wallet_id")
                            .from(WalletBalances::Table, WalletBalances::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Flows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Flows::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Flows::WalletId).string().not_null())
                    .col(ColumnDef::new(Flows::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Flows::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Flows::CategoryId).string().not_null())
                    .col(
                        ColumnDef::new(Flows::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Flows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Flows::OperatorId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-flows-wallet_id")
                            .from(Flows::Table, Flows::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-flows-category_id")
                            .from(Flows::Table, Flows::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-flows-operator_id")
                            .from(Flows::Table, Flows::OperatorId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-flows-wallet_id-created_at")
                    .table(Flows::Table)
                    .col(Flows::WalletId)
                    .col(Flows::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (children before parents)
        manager
            .drop_table(Table::drop().table(Flows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletOwners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
