use engine::{
    Currency, ErrorKind, Page, TransactionDraft, TransactionKind, TransactionListFilter,
};

mod common;
use common::{OWNER, day, engine_with_db, open_account, record};

async fn seed(engine: &engine::Engine) -> engine::Account {
    let mut account = open_account(engine).await;
    let entries = [
        ("Rent", TransactionKind::Expense, 90_000, day(1, 1), vec!["home", "fixed"]),
        ("Groceries", TransactionKind::Expense, 4_250, day(1, 3), vec!["food"]),
        ("Salary", TransactionKind::Income, 250_000, day(1, 25), vec!["work"]),
        ("groceries again", TransactionKind::Expense, 1_900, day(2, 2), vec!["food", "home"]),
        ("Bonus", TransactionKind::Income, 30_000, day(2, 10), vec!["work", "Fixed"]),
    ];
    for (title, kind, amount, payday, tags) in entries {
        let mut bucket = engine.find_statistic(account.id, payday).await.unwrap();
        let draft = TransactionDraft::new(OWNER, account.id, kind, title, amount, payday).tags(tags);
        engine
            .create_transaction(draft, &mut account, &mut bucket)
            .await
            .unwrap();
    }
    account
}

fn titles(entries: &[engine::Transaction]) -> Vec<&str> {
    entries.iter().map(|e| e.title.as_str()).collect()
}

#[tokio::test]
async fn title_filter_is_case_insensitive_substring() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    let filter = TransactionListFilter::default().title("GROCER");
    let entries = engine
        .list_transactions(OWNER, &filter, &Page::default())
        .await
        .unwrap();
    assert_eq!(titles(&entries), vec!["Groceries", "groceries again"]);
}

#[tokio::test]
async fn tag_filter_requires_every_tag() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    let filter = TransactionListFilter::default().tags(["Food", "home"]);
    let entries = engine
        .list_transactions(OWNER, &filter, &Page::default())
        .await
        .unwrap();
    assert_eq!(titles(&entries), vec!["groceries again"]);

    // Stored tags are normalized, so mixed-case input still matches.
    let filter = TransactionListFilter::default().tags(["fixed"]);
    let entries = engine
        .list_transactions(OWNER, &filter, &Page::default())
        .await
        .unwrap();
    assert_eq!(titles(&entries), vec!["Rent", "Bonus"]);
}

#[tokio::test]
async fn date_range_is_half_open() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    let filter = TransactionListFilter::default().between(Some(day(1, 3)), Some(day(2, 2)));
    let entries = engine
        .list_transactions(OWNER, &filter, &Page::default())
        .await
        .unwrap();
    assert_eq!(titles(&entries), vec!["Groceries", "Salary"]);

    let filter = TransactionListFilter::default().between(Some(day(2, 2)), None);
    assert_eq!(engine.count_transactions(OWNER, &filter).await.unwrap(), 2);

    let filter = TransactionListFilter::default().between(Some(day(2, 2)), Some(day(2, 2)));
    let err = engine
        .list_transactions(OWNER, &filter, &Page::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn predicates_combine_with_and() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    let filter = TransactionListFilter::default()
        .title("o")
        .tags(["work"])
        .between(Some(day(2, 1)), None);
    let entries = engine
        .list_transactions(OWNER, &filter, &Page::default())
        .await
        .unwrap();
    assert_eq!(titles(&entries), vec!["Bonus"]);
}

#[tokio::test]
async fn sorting_and_pagination() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    let filter = TransactionListFilter::default();

    let page = Page::new(1, 2).sort("-amount");
    let first = engine.list_transactions(OWNER, &filter, &page).await.unwrap();
    assert_eq!(titles(&first), vec!["Salary", "Rent"]);

    let page = Page::new(2, 2).sort("-amount");
    let second = engine.list_transactions(OWNER, &filter, &page).await.unwrap();
    assert_eq!(titles(&second), vec!["Bonus", "Groceries"]);

    let page = Page::new(3, 2).sort("-amount");
    let third = engine.list_transactions(OWNER, &filter, &page).await.unwrap();
    assert_eq!(titles(&third), vec!["groceries again"]);

    let page = Page::new(1, 10).sort("payday");
    let by_day = engine.list_transactions(OWNER, &filter, &page).await.unwrap();
    assert_eq!(by_day.first().unwrap().title, "Rent");
    assert_eq!(by_day.last().unwrap().title, "Bonus");

    let err = engine
        .list_transactions(OWNER, &filter, &Page::new(1, 10).sort("user_id"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = engine
        .list_transactions(OWNER, &filter, &Page::new(1, 101))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn ties_are_broken_by_id() {
    let (engine, _db) = engine_with_db().await;
    let mut account = open_account(&engine).await;
    let a = record(&engine, &mut account, TransactionKind::Expense, 500, day(5, 1)).await;
    let b = record(&engine, &mut account, TransactionKind::Expense, 500, day(5, 1)).await;
    let c = record(&engine, &mut account, TransactionKind::Expense, 500, day(5, 1)).await;

    let page = Page::new(1, 10).sort("-amount");
    let entries = engine
        .list_transactions(OWNER, &TransactionListFilter::default(), &page)
        .await
        .unwrap();
    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);
}

#[tokio::test]
async fn listing_is_scoped_to_owner_and_account() {
    let (engine, _db) = engine_with_db().await;
    let account = seed(&engine).await;
    let mut other = engine
        .new_account(OWNER + 1, "Theirs", None, Currency::Usd)
        .await
        .unwrap();
    let mut bucket = engine.find_statistic(other.id, day(1, 1)).await.unwrap();
    let draft = TransactionDraft::new(
        OWNER + 1,
        other.id,
        TransactionKind::Income,
        "Salary",
        1_000,
        day(1, 1),
    );
    engine
        .create_transaction(draft, &mut other, &mut bucket)
        .await
        .unwrap();

    let filter = TransactionListFilter::default();
    assert_eq!(engine.count_transactions(OWNER, &filter).await.unwrap(), 5);
    assert_eq!(engine.count_transactions(OWNER + 1, &filter).await.unwrap(), 1);

    let theirs = engine
        .list_account_transactions(other.id, &filter, &Page::default())
        .await
        .unwrap();
    assert_eq!(theirs.len(), 1);
    let ours = engine
        .list_account_transactions(account.id, &filter.title("salary"), &Page::default())
        .await
        .unwrap();
    assert_eq!(titles(&ours), vec!["Salary"]);
}

#[tokio::test]
async fn statistics_range_and_summary() {
    let (engine, _db) = engine_with_db().await;
    let account = seed(&engine).await;

    let buckets = engine
        .list_statistics(account.id, day(1, 1), day(2, 1))
        .await
        .unwrap();
    let dates: Vec<_> = buckets.iter().map(|b| b.date).collect();
    assert_eq!(dates, vec![day(1, 1), day(1, 3), day(1, 25)]);

    let summary = engine
        .summarize_statistics(account.id, day(1, 1), day(3, 1))
        .await
        .unwrap();
    assert_eq!(summary.days, 5);
    assert_eq!(summary.earning, 280_000);
    assert_eq!(summary.spending, 96_150);
    assert_eq!(summary.net(), account.balance());

    let err = engine
        .list_statistics(account.id, day(2, 1), day(1, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = engine
        .statistic_by_date(account.id, day(12, 31))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn accounts_crud() {
    let (engine, _db) = engine_with_db().await;
    let main = seed(&engine).await;
    let savings = engine
        .new_account(OWNER, "  Savings ", Some(" "), Currency::Gbp)
        .await
        .unwrap();
    assert_eq!(savings.title, "Savings");
    assert_eq!(savings.description, None);
    assert_eq!(savings.version, 1);

    let listed = engine
        .list_accounts(OWNER, &Page::default().sort("-title"))
        .await
        .unwrap();
    let names: Vec<_> = listed.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(names, vec!["Savings", "Main"]);

    let mut renamed = savings.clone();
    renamed.title = "Rainy day".to_string();
    assert_eq!(engine.update_account(&mut renamed).await.unwrap(), 2);
    let mut stale = savings.clone();
    stale.title = "Lost".to_string();
    let err = engine.update_account(&mut stale).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EditConflict);
    assert_eq!(stale.version, 1);

    let err = engine.delete_account(main.id, OWNER + 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    engine.delete_account(main.id, OWNER).await.unwrap();
    assert_eq!(
        engine.account(main.id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    let filter = TransactionListFilter::default();
    assert_eq!(engine.count_transactions(OWNER, &filter).await.unwrap(), 0);
    let buckets = engine
        .list_statistics(main.id, day(1, 1), day(12, 31))
        .await
        .unwrap();
    assert!(buckets.is_empty());
}
