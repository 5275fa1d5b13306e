use std::collections::BTreeSet;

use chrono::NaiveDate;
use sea_orm::{
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, prelude::*,
    sea_query::{Expr, SimpleExpr},
};

use crate::{
    EngineError, Page, ResultEngine, Transaction, TransactionSort,
    paging::SortOrder,
    transactions::{self, normalize_tags},
};

use super::super::Engine;

/// Filters for listing ledger entries.
///
/// All predicates are combined with AND. `from` is inclusive and `to` is
/// exclusive (`[from, to)`), both on the entry's payday.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    /// Case-insensitive substring match on the title; empty matches all.
    pub title: String,
    /// Entries must carry every one of these tags; empty matches all.
    pub tags: BTreeSet<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TransactionListFilter {
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidInput(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

/// Matches rows whose JSON `tags` array contains `tag`.
fn has_tag(tag: String) -> SimpleExpr {
    Expr::cust_with_values(
        "EXISTS (SELECT 1 FROM json_each(\"transactions\".\"tags\") WHERE json_each.value = ?)",
        [tag],
    )
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        let title = filter.title.trim();
        if !title.is_empty() {
            self = self.filter(transactions::Column::Title.contains(title));
        }

        for tag in normalize_tags(&filter.tags) {
            self = self.filter(has_tag(tag));
        }

        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::Payday.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::Payday.lt(to));
        }

        self
    }
}

fn sort_column(key: TransactionSort) -> transactions::Column {
    match key {
        TransactionSort::Id => transactions::Column::Id,
        TransactionSort::Title => transactions::Column::Title,
        TransactionSort::Payday => transactions::Column::Payday,
        TransactionSort::Amount => transactions::Column::AmountMinor,
        TransactionSort::CreatedAt => transactions::Column::CreatedAt,
    }
}

fn direction(order: &SortOrder<TransactionSort>) -> Order {
    if order.descending {
        Order::Desc
    } else {
        Order::Asc
    }
}

impl Engine {
    /// Lists a user's ledger entries, one page at a time.
    ///
    /// Rows are ordered by the page's sort key, ties broken by id ascending.
    pub async fn list_transactions(
        &self,
        user_id: i64,
        filter: &TransactionListFilter,
        page: &Page,
    ) -> ResultEngine<Vec<Transaction>> {
        let order: SortOrder<TransactionSort> = page.resolve()?;
        validate_list_filter(filter)?;

        let query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .apply_tx_filters(filter);
        self.fetch_page(query, &order, page).await
    }

    /// Lists the ledger entries of one account, one page at a time.
    pub async fn list_account_transactions(
        &self,
        account_id: i64,
        filter: &TransactionListFilter,
        page: &Page,
    ) -> ResultEngine<Vec<Transaction>> {
        let order: SortOrder<TransactionSort> = page.resolve()?;
        validate_list_filter(filter)?;

        let query = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .apply_tx_filters(filter);
        self.fetch_page(query, &order, page).await
    }

    /// Number of a user's entries matching `filter`, for page metadata.
    pub async fn count_transactions(
        &self,
        user_id: i64,
        filter: &TransactionListFilter,
    ) -> ResultEngine<u64> {
        validate_list_filter(filter)?;
        let total = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .apply_tx_filters(filter)
            .count(&self.database)
            .await?;
        Ok(total)
    }

    async fn fetch_page(
        &self,
        query: Select<transactions::Entity>,
        order: &SortOrder<TransactionSort>,
        page: &Page,
    ) -> ResultEngine<Vec<Transaction>> {
        let rows = query
            .order_by(sort_column(order.key), direction(order))
            .order_by_asc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.database)
            .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}
