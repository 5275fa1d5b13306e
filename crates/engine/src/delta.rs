//! Aggregate deltas implied by ledger mutations.
//!
//! A [`Delta`] is a signed change to an `(income, expense)` pair. Accounts
//! apply it to `total_income`/`total_expense`, statistic buckets to
//! `earning`/`spending`.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use chrono::NaiveDate;

use crate::{EngineError, ResultEngine, Transaction, TransactionKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Delta {
    pub income: i64,
    pub expense: i64,
}

impl Delta {
    pub const ZERO: Delta = Delta {
        income: 0,
        expense: 0,
    };

    /// `amount_minor` booked on the side matching `kind`.
    pub fn of(kind: TransactionKind, amount_minor: i64) -> Self {
        match kind {
            TransactionKind::Income => Self {
                income: amount_minor,
                expense: 0,
            },
            TransactionKind::Expense => Self {
                income: 0,
                expense: amount_minor,
            },
        }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    pub fn apply_income(self, current: i64) -> ResultEngine<i64> {
        checked(current, self.income)
    }

    pub fn apply_expense(self, current: i64) -> ResultEngine<i64> {
        checked(current, self.expense)
    }
}

fn checked(current: i64, change: i64) -> ResultEngine<i64> {
    current
        .checked_add(change)
        .ok_or_else(|| EngineError::InvalidAmount("aggregate overflow".to_string()))
}

impl Add for Delta {
    type Output = Delta;

    fn add(self, rhs: Delta) -> Self::Output {
        Delta {
            income: self.income.saturating_add(rhs.income),
            expense: self.expense.saturating_add(rhs.expense),
        }
    }
}

impl AddAssign for Delta {
    fn add_assign(&mut self, rhs: Delta) {
        *self = *self + rhs;
    }
}

impl Sub for Delta {
    type Output = Delta;

    fn sub(self, rhs: Delta) -> Self::Output {
        self + (-rhs)
    }
}

impl SubAssign for Delta {
    fn sub_assign(&mut self, rhs: Delta) {
        *self = *self - rhs;
    }
}

impl Neg for Delta {
    type Output = Delta;

    fn neg(self) -> Self::Output {
        Delta {
            income: self.income.saturating_neg(),
            expense: self.expense.saturating_neg(),
        }
    }
}

/// Deltas an edit of a ledger entry implies.
///
/// Built in a fixed order against the bucket of the entry's old payday:
///
/// 1. amount change, booked on the old kind,
/// 2. kind change, moving the new amount from the old kind to the new one,
/// 3. payday change, moving the new amount (on the new kind) out of the old
///    bucket into the bucket of the new payday.
///
/// Steps 1 and 2 also apply to the account; a payday move does not change
/// the account totals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct UpdatePlan {
    pub account: Delta,
    pub old_bucket: Delta,
    pub moved: Option<(NaiveDate, Delta)>,
}

impl UpdatePlan {
    pub fn between(old: &Transaction, new: &Transaction) -> Self {
        let mut running = Delta::ZERO;

        if new.amount_minor != old.amount_minor {
            running += Delta::of(old.kind, new.amount_minor - old.amount_minor);
        }

        if new.kind != old.kind {
            running -= Delta::of(old.kind, new.amount_minor);
            running += Delta::of(new.kind, new.amount_minor);
        }

        let mut old_bucket = running;
        let moved = (new.payday != old.payday).then(|| {
            let moved = Delta::of(new.kind, new.amount_minor);
            old_bucket -= moved;
            (new.payday, moved)
        });

        Self {
            account: running,
            old_bucket,
            moved,
        }
    }
}
