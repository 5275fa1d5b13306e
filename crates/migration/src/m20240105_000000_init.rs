//! Initial schema migration - creates all tables from scratch.
//!
//! - `accounts`: running income/expense totals per account
//! - `transactions`: the ledger
//! - `statistics`: one bucket per account and day, unique on
//!   `(account_id, date)`
//!
//! Every mutable table carries a `version` column for optimistic
//! concurrency. Deleting an account cascades to its entries and buckets.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    OwnerId,
    Title,
    Description,
    Currency,
    TotalIncome,
    TotalExpense,
    CreatedAt,
    Version,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    AccountId,
    Kind,
    Title,
    Description,
    Tags,
    AmountMinor,
    Payday,
    CreatedAt,
    Version,
}

#[derive(Iden)]
enum Statistics {
    Table,
    Id,
    AccountId,
    Date,
    Earning,
    Spending,
    CreatedAt,
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::Title).string().not_null())
                    .col(ColumnDef::new(Accounts::Description).string())
                    .col(
                        ColumnDef::new(Accounts::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(
                        ColumnDef::new(Accounts::TotalIncome)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::TotalExpense)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-owner_id")
                    .table(Accounts::Table)
                    .col(Accounts::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transactions::AccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Title).string().not_null())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::Tags)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Payday).date().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-payday")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::Payday)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-payday")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::Payday)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Statistics
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Statistics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Statistics::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Statistics::AccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Statistics::Date).date().not_null())
                    .col(
                        ColumnDef::new(Statistics::Earning)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Statistics::Spending)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Statistics::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Statistics::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-statistics-account_id")
                            .from(Statistics::Table, Statistics::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-statistics-account_id-date-unique")
                    .table(Statistics::Table)
                    .col(Statistics::AccountId)
                    .col(Statistics::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Statistics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
