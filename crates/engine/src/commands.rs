//! Command structs for engine operations.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};

use crate::{ResultEngine, Transaction, TransactionKind};
use crate::transactions::{
    ensure_positive, normalize_optional_text, normalize_tags, normalize_title,
};

/// A ledger entry that has not been stored yet.
///
/// Passed to [`Engine::create_transaction`], which assigns `id`,
/// `created_at` and `version`.
///
/// [`Engine::create_transaction`]: crate::Engine::create_transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDraft {
    pub user_id: i64,
    pub account_id: i64,
    pub kind: TransactionKind,
    pub title: String,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
    pub amount_minor: i64,
    pub payday: NaiveDate,
}

impl TransactionDraft {
    #[must_use]
    pub fn new(
        user_id: i64,
        account_id: i64,
        kind: TransactionKind,
        title: impl Into<String>,
        amount_minor: i64,
        payday: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            account_id,
            kind,
            title: title.into(),
            description: None,
            tags: BTreeSet::new(),
            amount_minor,
            payday,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
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

    /// Validates the draft and turns it into the row to insert.
    pub(crate) fn into_transaction(self) -> ResultEngine<Transaction> {
        ensure_positive(self.amount_minor)?;
        Ok(Transaction {
            id: 0,
            user_id: self.user_id,
            account_id: self.account_id,
            kind: self.kind,
            title: normalize_title(&self.title)?,
            description: normalize_optional_text(self.description.as_deref()),
            tags: normalize_tags(&self.tags),
            amount_minor: self.amount_minor,
            payday: self.payday,
            created_at: Utc::now(),
            version: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;

    fn payday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn draft_normalizes_text_fields() {
        let tx = TransactionDraft::new(1, 2, TransactionKind::Expense, "  Lunch ", 1250, payday())
            .description("   ")
            .tags(["Food", " food", "work"])
            .into_transaction()
            .unwrap();

        assert_eq!(tx.title, "Lunch");
        assert_eq!(tx.description, None);
        assert_eq!(tx.tags.len(), 2);
        assert_eq!(tx.version, 1);
    }

    #[test]
    fn draft_rejects_non_positive_amounts() {
        let err = TransactionDraft::new(1, 2, TransactionKind::Income, "Salary", 0, payday())
            .into_transaction()
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount_minor must be > 0".to_string())
        );
    }
}
