//! Coordinated ledger writes.
//!
//! Each operation takes the snapshots its caller loaded (the entry, its
//! account, the statistic bucket of its payday), computes the aggregate
//! deltas on copies, and persists everything inside one unit of work. The
//! caller's snapshots are replaced with the stored state only after the
//! commit, so a failed call leaves them untouched.

use chrono::NaiveDate;

use crate::{Account, EngineError, ResultEngine, Statistic, Transaction};

mod create;
mod delete;
mod update;

fn invalid(msg: &str) -> EngineError {
    EngineError::InvalidInput(msg.to_string())
}

fn ensure_same_account(entry_account_id: i64, account: &Account) -> ResultEngine<()> {
    if entry_account_id != account.id {
        return Err(invalid("entry does not belong to the given account"));
    }
    Ok(())
}

fn ensure_bucket_of(stat: &Statistic, account_id: i64, date: NaiveDate) -> ResultEngine<()> {
    if stat.account_id != account_id || stat.date != date {
        return Err(invalid("statistic bucket does not match entry account and payday"));
    }
    Ok(())
}

fn ensure_same_entry(new: &Transaction, old: &Transaction) -> ResultEngine<()> {
    if new.id != old.id || new.user_id != old.user_id {
        return Err(invalid("old and new entry snapshots differ in identity"));
    }
    if new.account_id != old.account_id {
        return Err(invalid("entries cannot move between accounts"));
    }
    if new.version != old.version {
        return Err(invalid("old and new entry snapshots differ in version"));
    }
    Ok(())
}
