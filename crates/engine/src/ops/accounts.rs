use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Order, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    Account, AccountSort, Currency, EngineError, Page, ResultEngine, accounts,
    paging::SortOrder,
    statistics,
    transactions::{self, normalize_optional_text, normalize_title},
    versioned::compare_and_swap,
};

use super::{Engine, with_tx};

pub(super) async fn find_account<C>(conn: &C, id: i64) -> ResultEngine<Account>
where
    C: ConnectionTrait,
{
    let model = accounts::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::not_found("account"))?;
    Account::try_from(model)
}

fn sort_column(key: AccountSort) -> accounts::Column {
    match key {
        AccountSort::Id => accounts::Column::Id,
        AccountSort::Title => accounts::Column::Title,
        AccountSort::CreatedAt => accounts::Column::CreatedAt,
    }
}

impl Engine {
    /// Opens a new account with zero totals.
    pub async fn new_account(
        &self,
        owner_id: i64,
        title: &str,
        description: Option<&str>,
        currency: Currency,
    ) -> ResultEngine<Account> {
        let account = Account {
            id: 0,
            owner_id,
            title: normalize_title(title)?,
            description: normalize_optional_text(description),
            currency,
            total_income: 0,
            total_expense: 0,
            created_at: Utc::now(),
            version: 1,
        };
        let model = accounts::ActiveModel::from(&account)
            .insert(&self.database)
            .await?;
        tracing::debug!(account_id = model.id, owner_id, "account created");
        Account::try_from(model)
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, id: i64) -> ResultEngine<Account> {
        find_account(&self.database, id).await
    }

    /// Writes the whole snapshot if nobody changed the account since it was
    /// read, and returns the new version.
    ///
    /// On success `account.version` is bumped; on [`EngineError::EditConflict`]
    /// the caller has to reload the account and redo its change.
    pub async fn update_account(&self, account: &mut Account) -> ResultEngine<i32> {
        let mut next = account.clone();
        next.title = normalize_title(&next.title)?;
        next.description = normalize_optional_text(next.description.as_deref());

        let version = compare_and_swap(&self.database, &mut next).await?;
        *account = next;
        Ok(version)
    }

    /// Deletes an account together with its ledger entries and buckets.
    pub async fn delete_account(&self, id: i64, owner_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = accounts::Entity::delete_many()
                .filter(accounts::Column::Id.eq(id))
                .filter(accounts::Column::OwnerId.eq(owner_id))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::not_found("account"));
            }

            transactions::Entity::delete_many()
                .filter(transactions::Column::AccountId.eq(id))
                .exec(&db_tx)
                .await?;
            statistics::Entity::delete_many()
                .filter(statistics::Column::AccountId.eq(id))
                .exec(&db_tx)
                .await?;

            tracing::debug!(account_id = id, owner_id, "account deleted");
            Ok(())
        })
    }

    /// Lists the accounts of `owner_id`, one page at a time.
    pub async fn list_accounts(&self, owner_id: i64, page: &Page) -> ResultEngine<Vec<Account>> {
        let order: SortOrder<AccountSort> = page.resolve()?;
        let direction = if order.descending {
            Order::Desc
        } else {
            Order::Asc
        };

        let models = accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .order_by(sort_column(order.key), direction)
            .order_by_asc(accounts::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.database)
            .await?;

        models.into_iter().map(Account::try_from).collect()
    }
}
