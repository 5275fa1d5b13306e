use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ConnectionTrait, QueryFilter, QueryOrder, SqlErr, prelude::*};

use crate::{
    EngineError, ResultEngine, Statistic, StatisticLookup, StatisticSummary, delta::Delta,
    statistics, versioned::compare_and_swap,
};

use super::Engine;

pub(super) async fn find_statistic_row<C>(
    conn: &C,
    account_id: i64,
    date: NaiveDate,
) -> ResultEngine<StatisticLookup>
where
    C: ConnectionTrait,
{
    let model = statistics::Entity::find()
        .filter(statistics::Column::AccountId.eq(account_id))
        .filter(statistics::Column::Date.eq(date))
        .one(conn)
        .await?;
    Ok(model.map(Statistic::from).into())
}

/// Stores a new bucket.
///
/// Losing a race against another writer creating the same `(account, date)`
/// bucket is reported as an edit conflict, like any other lost write.
pub(super) async fn insert_statistic<C>(conn: &C, stat: &Statistic) -> ResultEngine<Statistic>
where
    C: ConnectionTrait,
{
    let mut active = statistics::ActiveModel::from(stat);
    active.version = sea_orm::ActiveValue::Set(1);
    match active.insert(conn).await {
        Ok(model) => Ok(Statistic::from(model)),
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!(
                    account_id = stat.account_id,
                    date = %stat.date,
                    "statistic bucket created concurrently"
                );
                Err(EngineError::conflict("statistic"))
            }
            _ => Err(err.into()),
        },
    }
}

/// Adds `delta` to the bucket of `date`, creating the bucket when the day
/// has none yet.
pub(super) async fn add_to_bucket<C>(
    conn: &C,
    account_id: i64,
    date: NaiveDate,
    delta: Delta,
) -> ResultEngine<Statistic>
where
    C: ConnectionTrait,
{
    match find_statistic_row(conn, account_id, date).await? {
        StatisticLookup::Existing(mut stat) => {
            stat.apply(delta)?;
            compare_and_swap(conn, &mut stat).await?;
            Ok(stat)
        }
        StatisticLookup::Absent => {
            let mut stat = Statistic::empty(account_id, date);
            stat.apply(delta)?;
            insert_statistic(conn, &stat).await
        }
    }
}

pub(super) async fn list_statistic_rows<C>(
    conn: &C,
    account_id: i64,
    after: NaiveDate,
    before: NaiveDate,
) -> ResultEngine<Vec<Statistic>>
where
    C: ConnectionTrait,
{
    if after >= before {
        return Err(EngineError::InvalidInput(
            "invalid range: after must be < before".to_string(),
        ));
    }
    let models = statistics::Entity::find()
        .filter(statistics::Column::AccountId.eq(account_id))
        .filter(statistics::Column::Date.gte(after))
        .filter(statistics::Column::Date.lt(before))
        .order_by_asc(statistics::Column::Date)
        .all(conn)
        .await?;
    Ok(models.into_iter().map(Statistic::from).collect())
}

impl Engine {
    /// Returns the bucket of `date`, or `KeyNotFound` when the day has none.
    pub async fn statistic_by_date(
        &self,
        account_id: i64,
        date: NaiveDate,
    ) -> ResultEngine<Statistic> {
        self.find_statistic(account_id, date)
            .await?
            .into_existing()
            .ok_or_else(|| EngineError::not_found("statistic"))
    }

    /// Looks up the bucket of `date`.
    ///
    /// This is the snapshot [`Engine::create_transaction`] expects: an
    /// `Absent` bucket is created together with the entry.
    pub async fn find_statistic(
        &self,
        account_id: i64,
        date: NaiveDate,
    ) -> ResultEngine<StatisticLookup> {
        find_statistic_row(&self.database, account_id, date).await
    }

    /// Buckets with `after <= date < before`, oldest first.
    pub async fn list_statistics(
        &self,
        account_id: i64,
        after: NaiveDate,
        before: NaiveDate,
    ) -> ResultEngine<Vec<Statistic>> {
        list_statistic_rows(&self.database, account_id, after, before).await
    }

    /// Totals of the buckets with `after <= date < before`.
    pub async fn summarize_statistics(
        &self,
        account_id: i64,
        after: NaiveDate,
        before: NaiveDate,
    ) -> ResultEngine<StatisticSummary> {
        let stats = self.list_statistics(account_id, after, before).await?;
        Ok(stats.iter().collect())
    }
}
