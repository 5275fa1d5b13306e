//! The module contains `Account` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition,
    entity::prelude::*,
    sea_query::{Expr, SimpleExpr},
};
use serde::{Deserialize, Serialize};

use crate::{
    Currency, EngineError, ResultEngine, TransactionKind, delta::Delta,
    versioned::VersionedRecord,
};

/// An account.
///
/// `total_income` and `total_expense` are derived: they always equal the sum
/// of the amounts of the account's current ledger entries of that kind. They
/// only change as a side effect of the coordinator operations; the owner may
/// edit the metadata fields directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub currency: Currency,
    pub total_income: i64,
    pub total_expense: i64,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

impl Account {
    /// Running total for `kind`.
    #[must_use]
    pub fn total(&self, kind: TransactionKind) -> i64 {
        match kind {
            TransactionKind::Income => self.total_income,
            TransactionKind::Expense => self.total_expense,
        }
    }

    /// `total_income - total_expense`.
    #[must_use]
    pub fn balance(&self) -> i64 {
        self.total_income - self.total_expense
    }

    pub(crate) fn apply(&mut self, delta: Delta) -> ResultEngine<()> {
        self.total_income = delta.apply_income(self.total_income)?;
        self.total_expense = delta.apply_expense(self.total_expense)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub currency: String,
    pub total_income: i64,
    pub total_expense: i64,
    pub created_at: DateTimeUtc,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::statistics::Entity")]
    Statistics,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::statistics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Statistics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::NotSet,
            owner_id: ActiveValue::Set(value.owner_id),
            title: ActiveValue::Set(value.title.clone()),
            description: ActiveValue::Set(value.description.clone()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            total_income: ActiveValue::Set(value.total_income),
            total_expense: ActiveValue::Set(value.total_expense),
            created_at: ActiveValue::Set(value.created_at),
            version: ActiveValue::Set(value.version),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            title: model.title,
            description: model.description,
            currency: Currency::try_from(model.currency.as_str())?,
            total_income: model.total_income,
            total_expense: model.total_expense,
            created_at: model.created_at,
            version: model.version,
        })
    }
}

impl VersionedRecord for Account {
    type Entity = Entity;
    const LABEL: &'static str = "account";

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn key(&self) -> Condition {
        Condition::all().add(Column::Id.eq(self.id))
    }

    fn version_column() -> Column {
        Column::Version
    }

    fn assignments(&self) -> Vec<(Column, SimpleExpr)> {
        vec![
            (Column::Title, Expr::value(self.title.clone())),
            (Column::Description, Expr::value(self.description.clone())),
            (Column::Currency, Expr::value(self.currency.code())),
            (Column::TotalIncome, Expr::value(self.total_income)),
            (Column::TotalExpense, Expr::value(self.total_expense)),
        ]
    }
}
