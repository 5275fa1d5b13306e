#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{Account, Currency, Engine, Transaction, TransactionDraft, TransactionKind};
use migration::MigratorTrait;
use uuid::Uuid;

pub const OWNER: i64 = 1;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn engine_with_file_db() -> (Engine, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    (engine, url, path)
}

pub fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

pub async fn open_account(engine: &Engine) -> Account {
    engine
        .new_account(OWNER, "Main", None, Currency::Eur)
        .await
        .unwrap()
}

/// Creates an entry the way a handler does: look up the bucket of the
/// payday, then call the coordinator. Keeps `account` current.
pub async fn record(
    engine: &Engine,
    account: &mut Account,
    kind: TransactionKind,
    amount_minor: i64,
    payday: NaiveDate,
) -> Transaction {
    let mut bucket = engine.find_statistic(account.id, payday).await.unwrap();
    let draft = TransactionDraft::new(OWNER, account.id, kind, "Entry", amount_minor, payday);
    engine
        .create_transaction(draft, account, &mut bucket)
        .await
        .unwrap()
}
