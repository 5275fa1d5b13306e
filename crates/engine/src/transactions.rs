//! Ledger entries.
//!
//! A `Transaction` is one income or expense record of a user against an
//! account. Its amount is always a positive magnitude; the direction is
//! carried by [`TransactionKind`].

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition,
    entity::prelude::*,
    sea_query::{Expr, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine, versioned::VersionedRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub kind: TransactionKind,
    pub title: String,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
    pub amount_minor: i64,
    pub payday: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub version: i32,
}

impl Transaction {
    /// Normalizes the editable text fields and checks the amount.
    ///
    /// Called before every write so stored rows never carry untrimmed titles,
    /// empty descriptions or non-canonical tags.
    pub(crate) fn normalize(&mut self) -> ResultEngine<()> {
        ensure_positive(self.amount_minor)?;
        self.title = normalize_title(&self.title)?;
        self.description = normalize_optional_text(self.description.as_deref());
        self.tags = normalize_tags(std::mem::take(&mut self.tags));
        Ok(())
    }
}

pub(crate) fn ensure_positive(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn normalize_title(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(
            "title must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Canonical form of a tag: NFC, trimmed, lowercased. Empty tags are dropped.
pub(crate) fn normalize_tag(raw: &str) -> Option<String> {
    let tag: String = raw.trim().nfc().collect::<String>().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

pub(crate) fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .filter_map(|tag| normalize_tag(tag.as_ref()))
        .collect()
}

fn encode_tags(tags: &BTreeSet<String>) -> String {
    // A set of strings always serializes.
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

fn decode_tags(raw: &str) -> ResultEngine<BTreeSet<String>> {
    serde_json::from_str(raw)
        .map_err(|_| EngineError::InvalidInput(format!("invalid stored tags: {raw}")))
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    /// JSON array of normalized tags.
    pub tags: String,
    pub amount_minor: i64,
    pub payday: Date,
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

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(tx.user_id),
            account_id: ActiveValue::Set(tx.account_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            title: ActiveValue::Set(tx.title.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            tags: ActiveValue::Set(encode_tags(&tx.tags)),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            payday: ActiveValue::Set(tx.payday),
            created_at: ActiveValue::Set(tx.created_at),
            version: ActiveValue::Set(tx.version),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            account_id: model.account_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            title: model.title,
            description: model.description,
            tags: decode_tags(&model.tags)?,
            amount_minor: model.amount_minor,
            payday: model.payday,
            created_at: model.created_at,
            version: model.version,
        })
    }
}

impl VersionedRecord for Transaction {
    type Entity = Entity;
    const LABEL: &'static str = "transaction";

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
            (Column::Kind, Expr::value(self.kind.as_str())),
            (Column::Title, Expr::value(self.title.clone())),
            (Column::Description, Expr::value(self.description.clone())),
            (Column::Tags, Expr::value(encode_tags(&self.tags))),
            (Column::AmountMinor, Expr::value(self.amount_minor)),
            (Column::Payday, Expr::value(self.payday)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized_into_a_set() {
        let tags = normalize_tags(["  Food ", "food", "", "Cafe\u{301}", "café"]);
        let expected: BTreeSet<String> = ["café", "food"].into_iter().map(String::from).collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn tags_roundtrip_through_storage_encoding() {
        let tags = normalize_tags(["rent", "home"]);
        assert_eq!(encode_tags(&tags), r#"["home","rent"]"#);
        assert_eq!(decode_tags(r#"["home","rent"]"#).unwrap(), tags);
        assert!(decode_tags("home,rent").is_err());
    }

    #[test]
    fn kind_parses_only_known_values() {
        assert_eq!(
            TransactionKind::try_from("income").unwrap(),
            TransactionKind::Income
        );
        assert!(TransactionKind::try_from("transfer").is_err());
    }
}
