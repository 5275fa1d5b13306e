use sea_orm::TransactionTrait;

use crate::{
    Account, ResultEngine, Statistic, StatisticLookup, Transaction, TransactionDraft,
    delta::Delta, versioned::compare_and_swap,
};

use super::super::super::{
    Engine,
    statistics::insert_statistic,
    transactions::insert_transaction,
    with_tx,
};
use super::{ensure_bucket_of, ensure_same_account};

impl Engine {
    /// Records a new ledger entry and books it on the account and on the
    /// bucket of its payday.
    ///
    /// `statistic` is the lookup of the bucket of `draft.payday`: an
    /// [`StatisticLookup::Absent`] bucket is created. On success `account`
    /// and `statistic` hold the stored state and the new entry is returned.
    pub async fn create_transaction(
        &self,
        draft: TransactionDraft,
        account: &mut Account,
        statistic: &mut StatisticLookup,
    ) -> ResultEngine<Transaction> {
        ensure_same_account(draft.account_id, account)?;
        if let Some(stat) = statistic.existing() {
            ensure_bucket_of(stat, account.id, draft.payday)?;
        }

        let entry = draft.into_transaction()?;
        let delta = Delta::of(entry.kind, entry.amount_minor);

        let mut next_account = account.clone();
        next_account.apply(delta)?;

        let (mut next_bucket, bucket_exists) = match statistic.existing() {
            Some(stat) => (stat.clone(), true),
            None => (Statistic::empty(account.id, entry.payday), false),
        };
        next_bucket.apply(delta)?;

        tracing::debug!(
            account_id = account.id,
            payday = %entry.payday,
            kind = entry.kind.as_str(),
            amount_minor = entry.amount_minor,
            bucket_exists,
            "creating ledger entry"
        );

        let (stored, bucket) = with_tx!(self, |db_tx| {
            let stored = insert_transaction(&db_tx, &entry).await?;
            compare_and_swap(&db_tx, &mut next_account).await?;

            let bucket = if bucket_exists {
                let mut bucket = next_bucket.clone();
                compare_and_swap(&db_tx, &mut bucket).await?;
                bucket
            } else {
                insert_statistic(&db_tx, &next_bucket).await?
            };

            Ok((stored, bucket))
        })?;

        *account = next_account;
        *statistic = StatisticLookup::Existing(bucket);
        Ok(stored)
    }
}
