//! Ledger store.
//!
//! Rows of `transactions` are only written from the coordinator operations
//! in [`write`]; the primitives here take any connection so they can run
//! inside a unit of work.

use sea_orm::{ActiveModelTrait, ConnectionTrait, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, Transaction, transactions, versioned::compare_and_swap};

use super::Engine;

mod list;
mod write;

pub use list::TransactionListFilter;

/// Stores a new entry; the returned copy carries the assigned id.
pub(super) async fn insert_transaction<C>(conn: &C, tx: &Transaction) -> ResultEngine<Transaction>
where
    C: ConnectionTrait,
{
    let model = transactions::ActiveModel::from(tx).insert(conn).await?;
    Transaction::try_from(model)
}

pub(super) async fn find_transaction<C>(conn: &C, id: i64) -> ResultEngine<Transaction>
where
    C: ConnectionTrait,
{
    let model = transactions::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::not_found("transaction"))?;
    Transaction::try_from(model)
}

/// Compare-and-swap write of every mutable field of `tx`.
pub(super) async fn update_transaction_row<C>(conn: &C, tx: &mut Transaction) -> ResultEngine<i32>
where
    C: ConnectionTrait,
{
    compare_and_swap(conn, tx).await
}

/// Deletes the row only if it belongs to `user_id`.
pub(super) async fn delete_transaction_row<C>(conn: &C, id: i64, user_id: i64) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let result = transactions::Entity::delete_many()
        .filter(transactions::Column::Id.eq(id))
        .filter(transactions::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(EngineError::not_found("transaction"));
    }
    Ok(())
}

impl Engine {
    /// Returns one ledger entry.
    pub async fn transaction(&self, id: i64) -> ResultEngine<Transaction> {
        find_transaction(&self.database, id).await
    }

    /// Returns one ledger entry of `user_id`; entries of other users are
    /// reported as not found.
    pub async fn user_transaction(&self, id: i64, user_id: i64) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(id)
            .filter(transactions::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::not_found("transaction"))?;
        Transaction::try_from(model)
    }
}
