//! Aggregates re-derived from the ledger.
//!
//! Used to check (and repair) that the account totals and the statistic
//! buckets of an account still match its ledger entries.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Account, Statistic, Transaction, delta::Delta};

/// A bucket whose stored figures differ from its ledger entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDrift {
    pub date: NaiveDate,
    /// `false` when the day has entries but no bucket row.
    pub stored: bool,
    pub stored_earning: i64,
    pub stored_spending: i64,
    pub expected_earning: i64,
    pub expected_spending: i64,
}

/// Outcome of comparing an account's aggregates with its ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub account_id: i64,
    pub entries: u64,
    pub stored_income: i64,
    pub stored_expense: i64,
    pub expected_income: i64,
    pub expected_expense: i64,
    pub buckets: Vec<BucketDrift>,
}

impl AggregateReport {
    #[must_use]
    pub fn account_drifted(&self) -> bool {
        self.stored_income != self.expected_income || self.stored_expense != self.expected_expense
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        !self.account_drifted() && self.buckets.is_empty()
    }
}

/// Totals a full replay of the ledger yields.
#[derive(Debug, Default)]
pub(crate) struct LedgerTotals {
    pub entries: u64,
    pub account: Delta,
    pub days: BTreeMap<NaiveDate, Delta>,
}

impl<'a> FromIterator<&'a Transaction> for LedgerTotals {
    fn from_iter<I: IntoIterator<Item = &'a Transaction>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut acc, tx| {
            let delta = Delta::of(tx.kind, tx.amount_minor);
            acc.entries += 1;
            acc.account += delta;
            *acc.days.entry(tx.payday).or_default() += delta;
            acc
        })
    }
}

impl LedgerTotals {
    /// Compares the stored aggregates with the replayed ones.
    ///
    /// Buckets without entries are expected to be zero; days with entries but
    /// without a bucket are reported as not stored.
    pub fn compare(&self, account: &Account, buckets: &[Statistic]) -> AggregateReport {
        let mut drift = Vec::new();
        let mut seen = BTreeSet::new();

        for stat in buckets {
            let expected = self.days.get(&stat.date).copied().unwrap_or_default();
            seen.insert(stat.date);
            if stat.earning != expected.income || stat.spending != expected.expense {
                drift.push(BucketDrift {
                    date: stat.date,
                    stored: true,
                    stored_earning: stat.earning,
                    stored_spending: stat.spending,
                    expected_earning: expected.income,
                    expected_spending: expected.expense,
                });
            }
        }

        for (date, expected) in &self.days {
            if !seen.contains(date) {
                drift.push(BucketDrift {
                    date: *date,
                    stored: false,
                    stored_earning: 0,
                    stored_spending: 0,
                    expected_earning: expected.income,
                    expected_spending: expected.expense,
                });
            }
        }
        drift.sort_by_key(|d| d.date);

        AggregateReport {
            account_id: account.id,
            entries: self.entries,
            stored_income: account.total_income,
            stored_expense: account.total_expense,
            expected_income: self.account.income,
            expected_expense: self.account.expense,
            buckets: drift,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{Currency, TransactionKind};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn entry(kind: TransactionKind, amount_minor: i64, payday: NaiveDate) -> Transaction {
        Transaction {
            id: 1,
            user_id: 1,
            account_id: 7,
            kind,
            title: "Groceries".to_string(),
            description: None,
            tags: BTreeSet::new(),
            amount_minor,
            payday,
            created_at: Utc::now(),
            version: 1,
        }
    }

    fn account(total_income: i64, total_expense: i64) -> Account {
        Account {
            id: 7,
            owner_id: 1,
            title: "Main".to_string(),
            description: None,
            currency: Currency::Eur,
            total_income,
            total_expense,
            created_at: Utc::now(),
            version: 3,
        }
    }

    #[test]
    fn consistent_aggregates_report_no_drift() {
        let ledger = [
            entry(TransactionKind::Income, 500, day(1)),
            entry(TransactionKind::Expense, 120, day(1)),
            entry(TransactionKind::Expense, 30, day(2)),
        ];
        let totals: LedgerTotals = ledger.iter().collect();

        let mut first = Statistic::empty(7, day(1));
        first.earning = 500;
        first.spending = 120;
        let mut second = Statistic::empty(7, day(2));
        second.spending = 30;
        // A bucket emptied by deletes stays at zero.
        let emptied = Statistic::empty(7, day(3));

        let report = totals.compare(&account(500, 150), &[first, second, emptied]);
        assert!(report.is_consistent());
        assert_eq!(report.entries, 3);
    }

    #[test]
    fn drift_lists_wrong_and_missing_buckets() {
        let ledger = [
            entry(TransactionKind::Income, 500, day(1)),
            entry(TransactionKind::Income, 80, day(4)),
        ];
        let totals: LedgerTotals = ledger.iter().collect();

        let mut stale = Statistic::empty(7, day(1));
        stale.earning = 450;

        let report = totals.compare(&account(530, 0), &[stale]);
        assert!(report.account_drifted());
        assert_eq!(report.expected_income, 580);
        assert_eq!(report.buckets.len(), 2);
        assert_eq!(report.buckets[0].date, day(1));
        assert!(report.buckets[0].stored);
        assert_eq!(report.buckets[1].date, day(4));
        assert!(!report.buckets[1].stored);
        assert_eq!(report.buckets[1].expected_earning, 80);
    }

    #[test]
    fn replay_saturates_on_huge_ledgers() {
        let ledger = [
            entry(TransactionKind::Income, i64::MAX, day(1)),
            entry(TransactionKind::Income, 5, day(1)),
        ];
        let totals: LedgerTotals = ledger.iter().collect();

        assert_eq!(totals.account.income, i64::MAX);
        assert_eq!(totals.days[&day(1)].income, i64::MAX);
    }
}
