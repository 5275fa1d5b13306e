//! Per-account, per-day statistic buckets.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition,
    entity::prelude::*,
    sea_query::{Expr, SimpleExpr},
};
use serde::{Deserialize, Serialize};

use crate::{ResultEngine, TransactionKind, delta::Delta, versioned::VersionedRecord};

/// A statistic bucket keyed by `(account_id, date)`.
///
/// `earning`/`spending` equal the sums of the income/expense amounts of the
/// account's ledger entries on that exact day. A bucket is created with the
/// first entry of its day and is kept even when it drops back to zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    pub account_id: i64,
    pub date: NaiveDate,
    pub earning: i64,
    pub spending: i64,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

impl Statistic {
    /// A bucket that has not been stored yet.
    pub(crate) fn empty(account_id: i64, date: NaiveDate) -> Self {
        Self {
            account_id,
            date,
            earning: 0,
            spending: 0,
            created_at: Utc::now(),
            version: 1,
        }
    }

    /// Bucket figure for `kind`.
    #[must_use]
    pub fn amount(&self, kind: TransactionKind) -> i64 {
        match kind {
            TransactionKind::Income => self.earning,
            TransactionKind::Expense => self.spending,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.earning == 0 && self.spending == 0
    }

    pub(crate) fn apply(&mut self, delta: Delta) -> ResultEngine<()> {
        self.earning = delta.apply_income(self.earning)?;
        self.spending = delta.apply_expense(self.spending)?;
        Ok(())
    }
}

/// Outcome of looking up the bucket of a day.
///
/// `Absent` is the normal signal that the next entry on that day has to
/// create the bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatisticLookup {
    Existing(Statistic),
    Absent,
}

impl StatisticLookup {
    #[must_use]
    pub fn existing(&self) -> Option<&Statistic> {
        match self {
            Self::Existing(stat) => Some(stat),
            Self::Absent => None,
        }
    }

    #[must_use]
    pub fn into_existing(self) -> Option<Statistic> {
        match self {
            Self::Existing(stat) => Some(stat),
            Self::Absent => None,
        }
    }
}

impl From<Option<Statistic>> for StatisticLookup {
    fn from(value: Option<Statistic>) -> Self {
        value.map_or(Self::Absent, Self::Existing)
    }
}

/// Totals of the buckets of a date range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticSummary {
    pub days: u64,
    pub earning: i64,
    pub spending: i64,
}

impl StatisticSummary {
    #[must_use]
    pub fn net(&self) -> i64 {
        self.earning.saturating_sub(self.spending)
    }
}

impl<'a> FromIterator<&'a Statistic> for StatisticSummary {
    fn from_iter<I: IntoIterator<Item = &'a Statistic>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StatisticSummary::default(), |mut acc, stat| {
                acc.days += 1;
                acc.earning = acc.earning.saturating_add(stat.earning);
                acc.spending = acc.spending.saturating_add(stat.spending);
                acc
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "statistics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub account_id: i64,
    pub date: Date,
    pub earning: i64,
    pub spending: i64,
    pub created_at: DateTimeUtc,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Statistic> for ActiveModel {
    fn from(value: &Statistic) -> Self {
        Self {
            id: ActiveValue::NotSet,
            account_id: ActiveValue::Set(value.account_id),
            date: ActiveValue::Set(value.date),
            earning: ActiveValue::Set(value.earning),
            spending: ActiveValue::Set(value.spending),
            created_at: ActiveValue::Set(value.created_at),
            version: ActiveValue::Set(value.version),
        }
    }
}

impl From<Model> for Statistic {
    fn from(model: Model) -> Self {
        Self {
            account_id: model.account_id,
            date: model.date,
            earning: model.earning,
            spending: model.spending,
            created_at: model.created_at,
            version: model.version,
        }
    }
}

impl VersionedRecord for Statistic {
    type Entity = Entity;
    const LABEL: &'static str = "statistic";

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn key(&self) -> Condition {
        Condition::all()
            .add(Column::AccountId.eq(self.account_id))
            .add(Column::Date.eq(self.date))
    }

    fn version_column() -> Column {
        Column::Version
    }

    fn assignments(&self) -> Vec<(Column, SimpleExpr)> {
        vec![
            (Column::Earning, Expr::value(self.earning)),
            (Column::Spending, Expr::value(self.spending)),
        ]
    }
}
