use sea_orm::TransactionTrait;

use crate::{
    Account, ResultEngine, Statistic, Transaction, delta::Delta, versioned::compare_and_swap,
};

use super::super::super::{Engine, transactions::delete_transaction_row, with_tx};
use super::{ensure_bucket_of, ensure_same_account};

impl Engine {
    /// Deletes a ledger entry and takes its amount back out of the account
    /// and the bucket of its payday.
    ///
    /// The bucket is kept even when it drops to zero.
    pub async fn delete_transaction(
        &self,
        entry: &Transaction,
        account: &mut Account,
        statistic: &mut Statistic,
    ) -> ResultEngine<()> {
        ensure_same_account(entry.account_id, account)?;
        ensure_bucket_of(statistic, account.id, entry.payday)?;

        let delta = -Delta::of(entry.kind, entry.amount_minor);
        let mut next_account = account.clone();
        next_account.apply(delta)?;
        let mut next_bucket = statistic.clone();
        next_bucket.apply(delta)?;

        tracing::debug!(entry_id = entry.id, delta = ?delta, "deleting ledger entry");

        with_tx!(self, |db_tx| {
            delete_transaction_row(&db_tx, entry.id, entry.user_id).await?;
            compare_and_swap(&db_tx, &mut next_account).await?;
            compare_and_swap(&db_tx, &mut next_bucket).await?;
            Ok(())
        })?;

        *account = next_account;
        *statistic = next_bucket;
        Ok(())
    }
}
