//! Replays every combination of amount, kind and payday edits and checks
//! that account totals and buckets still equal the sums of the ledger.

use engine::{Engine, StatisticLookup, TransactionKind};

mod common;
use common::{day, engine_with_db, open_account, record};

const KINDS: [TransactionKind; 2] = [TransactionKind::Income, TransactionKind::Expense];

fn figure(kind: TransactionKind, target: TransactionKind, amount: i64) -> i64 {
    if kind == target { amount } else { 0 }
}

async fn bucket_figures(engine: &Engine, account_id: i64, date: chrono::NaiveDate) -> (i64, i64) {
    match engine.find_statistic(account_id, date).await.unwrap() {
        StatisticLookup::Existing(stat) => (stat.earning, stat.spending),
        StatisticLookup::Absent => (0, 0),
    }
}

#[tokio::test]
async fn every_edit_combination_keeps_aggregates_consistent() {
    let old_day = day(1, 5);
    let other_day = day(2, 1);

    for old_kind in KINDS {
        for new_kind in KINDS {
            for new_amount in [100, 40, 250] {
                for move_day in [false, true] {
                    let (engine, _db) = engine_with_db().await;
                    let mut account = open_account(&engine).await;

                    // Unrelated entries on both days.
                    record(&engine, &mut account, TransactionKind::Income, 1_000, old_day).await;
                    record(&engine, &mut account, TransactionKind::Expense, 300, other_day).await;

                    let old = record(&engine, &mut account, old_kind, 100, old_day).await;
                    let mut old_bucket =
                        engine.statistic_by_date(account.id, old_day).await.unwrap();

                    let mut new = old.clone();
                    new.kind = new_kind;
                    new.amount_minor = new_amount;
                    if move_day {
                        new.payday = other_day;
                    }

                    let case = format!(
                        "{old_kind:?}->{new_kind:?}, 100->{new_amount}, move_day={move_day}"
                    );
                    let moved = engine
                        .update_transaction(&mut new, &old, &mut account, &mut old_bucket)
                        .await
                        .unwrap();
                    assert_eq!(moved.is_some(), move_day, "{case}");

                    let income = 1_000 + figure(new_kind, TransactionKind::Income, new_amount);
                    let expense = 300 + figure(new_kind, TransactionKind::Expense, new_amount);
                    assert_eq!(
                        (account.total_income, account.total_expense),
                        (income, expense),
                        "{case}"
                    );

                    let (on_old, on_other) = if move_day {
                        ((1_000, 0), (
                            figure(new_kind, TransactionKind::Income, new_amount),
                            300 + figure(new_kind, TransactionKind::Expense, new_amount),
                        ))
                    } else {
                        ((
                            1_000 + figure(new_kind, TransactionKind::Income, new_amount),
                            figure(new_kind, TransactionKind::Expense, new_amount),
                        ), (0, 300))
                    };
                    assert_eq!(
                        bucket_figures(&engine, account.id, old_day).await,
                        on_old,
                        "{case}"
                    );
                    assert_eq!((old_bucket.earning, old_bucket.spending), on_old, "{case}");
                    assert_eq!(
                        bucket_figures(&engine, account.id, other_day).await,
                        on_other,
                        "{case}"
                    );

                    let report = engine.verify_aggregates(account.id).await.unwrap();
                    assert!(report.is_consistent(), "{case}: {report:?}");

                    // Deleting the edited entry takes it back out of its
                    // current bucket.
                    let mut current_bucket = engine
                        .statistic_by_date(account.id, new.payday)
                        .await
                        .unwrap();
                    engine
                        .delete_transaction(&new, &mut account, &mut current_bucket)
                        .await
                        .unwrap();
                    assert_eq!(
                        (account.total_income, account.total_expense),
                        (1_000, 300),
                        "{case}"
                    );
                    let report = engine.verify_aggregates(account.id).await.unwrap();
                    assert!(report.is_consistent(), "{case}: {report:?}");
                }
            }
        }
    }
}

#[tokio::test]
async fn recompute_repairs_drifted_aggregates() {
    let (engine, _db) = engine_with_db().await;
    let mut account = open_account(&engine).await;
    record(&engine, &mut account, TransactionKind::Income, 500, day(3, 1)).await;
    record(&engine, &mut account, TransactionKind::Expense, 120, day(3, 2)).await;

    // Corrupt the totals through a plain account write.
    let mut corrupted = account.clone();
    corrupted.total_income = 1;
    engine.update_account(&mut corrupted).await.unwrap();

    let report = engine.verify_aggregates(account.id).await.unwrap();
    assert!(report.account_drifted());
    assert_eq!(report.stored_income, 1);
    assert_eq!(report.expected_income, 500);
    assert!(report.buckets.is_empty());

    let repaired = engine.recompute_aggregates(account.id).await.unwrap();
    assert_eq!(repaired, report);

    let fixed = engine.account(account.id).await.unwrap();
    assert_eq!((fixed.total_income, fixed.total_expense), (500, 120));
    assert!(engine.verify_aggregates(account.id).await.unwrap().is_consistent());

    // Nothing left to repair: no version bump.
    engine.recompute_aggregates(account.id).await.unwrap();
    assert_eq!(engine.account(account.id).await.unwrap().version, fixed.version);
}
