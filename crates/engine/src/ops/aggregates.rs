use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    AggregateReport, ResultEngine, Statistic, Transaction, aggregates::LedgerTotals, statistics,
    transactions, versioned::compare_and_swap,
};

use super::{
    Engine,
    accounts::find_account,
    statistics::insert_statistic,
    with_tx,
};

async fn load_ledger<C>(conn: &C, account_id: i64) -> ResultEngine<Vec<Transaction>>
where
    C: ConnectionTrait,
{
    let models = transactions::Entity::find()
        .filter(transactions::Column::AccountId.eq(account_id))
        .order_by_asc(transactions::Column::Id)
        .all(conn)
        .await?;
    models.into_iter().map(Transaction::try_from).collect()
}

async fn load_buckets<C>(conn: &C, account_id: i64) -> ResultEngine<Vec<Statistic>>
where
    C: ConnectionTrait,
{
    let models = statistics::Entity::find()
        .filter(statistics::Column::AccountId.eq(account_id))
        .order_by_asc(statistics::Column::Date)
        .all(conn)
        .await?;
    Ok(models.into_iter().map(Statistic::from).collect())
}

impl Engine {
    /// Replays the ledger of an account and reports where the stored totals
    /// and buckets disagree with it. Nothing is written.
    pub async fn verify_aggregates(&self, account_id: i64) -> ResultEngine<AggregateReport> {
        with_tx!(self, |db_tx| {
            let account = find_account(&db_tx, account_id).await?;
            let ledger = load_ledger(&db_tx, account_id).await?;
            let buckets = load_buckets(&db_tx, account_id).await?;

            let totals: LedgerTotals = ledger.iter().collect();
            Ok(totals.compare(&account, &buckets))
        })
    }

    /// Rewrites the account totals and buckets of an account from its ledger.
    ///
    /// Drifted rows are written with compare-and-swap, missing buckets are
    /// created and buckets without entries are zeroed. Returns the drift
    /// found before the repair.
    pub async fn recompute_aggregates(&self, account_id: i64) -> ResultEngine<AggregateReport> {
        with_tx!(self, |db_tx| {
            let mut account = find_account(&db_tx, account_id).await?;
            let ledger = load_ledger(&db_tx, account_id).await?;
            let buckets = load_buckets(&db_tx, account_id).await?;

            let totals: LedgerTotals = ledger.iter().collect();
            let report = totals.compare(&account, &buckets);
            if report.is_consistent() {
                return Ok(report);
            }

            if report.account_drifted() {
                account.total_income = report.expected_income;
                account.total_expense = report.expected_expense;
                compare_and_swap(&db_tx, &mut account).await?;
            }

            for drift in &report.buckets {
                let mut stat = buckets
                    .iter()
                    .find(|stat| stat.date == drift.date)
                    .cloned()
                    .unwrap_or_else(|| Statistic::empty(account_id, drift.date));
                stat.earning = drift.expected_earning;
                stat.spending = drift.expected_spending;

                if drift.stored {
                    compare_and_swap(&db_tx, &mut stat).await?;
                } else {
                    insert_statistic(&db_tx, &stat).await?;
                }
            }

            tracing::info!(
                account_id,
                drifted_buckets = report.buckets.len(),
                account_drifted = report.account_drifted(),
                "aggregates recomputed"
            );
            Ok(report)
        })
    }
}
