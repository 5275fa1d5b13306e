use sea_orm::TransactionTrait;

use crate::{
    Account, ResultEngine, Statistic, Transaction, delta::UpdatePlan,
    versioned::compare_and_swap,
};

use super::super::super::{
    Engine,
    statistics::add_to_bucket,
    transactions::update_transaction_row,
    with_tx,
};
use super::{ensure_bucket_of, ensure_same_account, ensure_same_entry};

impl Engine {
    /// Replaces a ledger entry and moves its contribution on the account and
    /// the statistic buckets.
    ///
    /// - `new` is the edited entry; its `version` must be the stored one.
    /// - `old` is the entry as it was read before the edit.
    /// - `old_statistic` is the bucket of `old.payday`.
    ///
    /// When the payday changes, the bucket of the new payday is looked up (and
    /// created if needed) inside the same unit of work and returned. On
    /// success `new`, `account` and `old_statistic` hold the stored state.
    pub async fn update_transaction(
        &self,
        new: &mut Transaction,
        old: &Transaction,
        account: &mut Account,
        old_statistic: &mut Statistic,
    ) -> ResultEngine<Option<Statistic>> {
        ensure_same_entry(new, old)?;
        ensure_same_account(old.account_id, account)?;
        ensure_bucket_of(old_statistic, account.id, old.payday)?;

        let mut next_entry = new.clone();
        next_entry.normalize()?;

        let plan = UpdatePlan::between(old, &next_entry);
        let mut next_account = account.clone();
        next_account.apply(plan.account)?;
        let mut next_old_bucket = old_statistic.clone();
        next_old_bucket.apply(plan.old_bucket)?;

        tracing::debug!(
            entry_id = old.id,
            account_delta = ?plan.account,
            old_bucket_delta = ?plan.old_bucket,
            moved = ?plan.moved,
            "updating ledger entry"
        );

        let new_bucket = with_tx!(self, |db_tx| {
            update_transaction_row(&db_tx, &mut next_entry).await?;
            compare_and_swap(&db_tx, &mut next_account).await?;
            compare_and_swap(&db_tx, &mut next_old_bucket).await?;

            match plan.moved {
                Some((date, delta)) => Ok(Some(
                    add_to_bucket(&db_tx, account.id, date, delta).await?,
                )),
                None => Ok(None),
            }
        })?;

        *new = next_entry;
        *account = next_account;
        *old_statistic = next_old_bucket;
        Ok(new_bucket)
    }
}
