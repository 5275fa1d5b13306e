//! Optimistic versioning shared by every mutable table.
//!
//! Accounts, statistic buckets and ledger entries all carry a `version`
//! column. A write is a compare-and-swap: the row is only updated when its
//! stored version still equals the version the caller read, and the version
//! is bumped in the same statement.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    sea_query::{Expr, SimpleExpr},
};

use crate::{EngineError, ResultEngine};

/// A domain type persisted in a versioned row.
pub(crate) trait VersionedRecord {
    type Entity: EntityTrait;

    /// Used in conflict messages.
    const LABEL: &'static str;

    fn version(&self) -> i32;

    fn set_version(&mut self, version: i32);

    /// Condition matching the row identity (without the version).
    fn key(&self) -> Condition;

    fn version_column() -> <Self::Entity as EntityTrait>::Column;

    /// Every column a full-snapshot write sets.
    fn assignments(&self) -> Vec<(<Self::Entity as EntityTrait>::Column, SimpleExpr)>;
}

/// Writes `record` if its stored version still matches, then bumps the
/// in-memory version.
///
/// Returns the new version, or [`EngineError::EditConflict`] when no row
/// matched (the row changed or vanished since it was read).
pub(crate) async fn compare_and_swap<C, R>(conn: &C, record: &mut R) -> ResultEngine<i32>
where
    C: ConnectionTrait,
    R: VersionedRecord,
{
    let version = R::version_column();
    let mut update = R::Entity::update_many()
        .col_expr(version, Expr::col(version).add(1))
        .filter(record.key())
        .filter(version.eq(record.version()));
    for (column, value) in record.assignments() {
        update = update.col_expr(column, value);
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        tracing::debug!(
            record = R::LABEL,
            expected_version = record.version(),
            "compare-and-swap lost"
        );
        return Err(EngineError::conflict(R::LABEL));
    }

    let next = record.version() + 1;
    record.set_version(next);
    Ok(next)
}
