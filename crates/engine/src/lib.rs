//! Ledger engine for Spendbook.
//!
//! The engine keeps three tables consistent with each other:
//!
//! - `transactions`: the ledger (income and expense entries)
//! - `accounts`: running `total_income` / `total_expense` per account
//! - `statistics`: one bucket per `(account, day)` with `earning` / `spending`
//!
//! Ledger entries are only created, edited and deleted through the
//! coordinator operations on [`Engine`] ([`Engine::create_transaction`],
//! [`Engine::update_transaction`], [`Engine::delete_transaction`]), which
//! apply the aggregate deltas inside the same database transaction and rely
//! on optimistic versioning for concurrency control.

pub use accounts::Account;
pub use aggregates::{AggregateReport, BucketDrift};
pub use commands::TransactionDraft;
pub use currency::Currency;
pub use error::{EngineError, ErrorKind};
pub use money::Money;
pub use ops::{DEFAULT_TX_TIMEOUT, Engine, EngineBuilder, TransactionListFilter};
pub use paging::{AccountSort, MAX_PAGE_SIZE, Page, SortOrder, TransactionSort};
pub use statistics::{Statistic, StatisticLookup, StatisticSummary};
pub use transactions::{Transaction, TransactionKind};

mod accounts;
mod aggregates;
mod commands;
mod currency;
mod delta;
mod error;
mod money;
mod ops;
mod paging;
mod statistics;
mod transactions;
mod versioned;

type ResultEngine<T> = Result<T, EngineError>;
