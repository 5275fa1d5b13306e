//! Command handlers. Each ledger command loads the snapshots the engine
//! needs, calls the coordinator, and reloads and retries a bounded number
//! of times when it loses an edit conflict.

use std::future::Future;

use engine::{
    Account, Currency, Engine, EngineError, ErrorKind, Money, Statistic, Transaction,
    TransactionDraft, TransactionListFilter,
};
use serde::Serialize;

use crate::cli::{
    AccountCommand, AggregatesCommand, Command, EntryAddArgs, EntryCommand, EntryEditArgs,
    EntryListArgs, StatsCommand,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub struct Context {
    pub engine: Engine,
    pub conflict_retries: u32,
    pub json: bool,
}

impl Context {
    fn print<T, F>(&self, value: &T, human: F) -> CliResult<()>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human(value));
        }
        Ok(())
    }
}

/// Runs `op` again while it fails with an edit conflict, at most `retries`
/// extra times.
async fn retry_on_conflict<T, F, Fut>(retries: u32, mut op: F) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.kind() == ErrorKind::EditConflict && attempt < retries => {
                attempt += 1;
                tracing::warn!(attempt, error = %err, "edit conflict, reloading snapshots");
            }
            outcome => return outcome,
        }
    }
}

fn describe_account(account: &Account) -> String {
    format!(
        "#{} {} (owner {}): income {}, expense {}, balance {} [v{}]",
        account.id,
        account.title,
        account.owner_id,
        Money::new(account.total_income, account.currency),
        Money::new(account.total_expense, account.currency),
        Money::new(account.balance(), account.currency),
        account.version
    )
}

fn describe_entry(entry: &Transaction) -> String {
    let tags = entry.tags.iter().cloned().collect::<Vec<_>>().join(",");
    format!(
        "#{} {} {} {} {} [{}] account {} [v{}]",
        entry.id,
        entry.payday,
        entry.kind.as_str(),
        entry.amount_minor,
        entry.title,
        tags,
        entry.account_id,
        entry.version
    )
}

fn describe_bucket(stat: &Statistic) -> String {
    format!(
        "{} earning {} spending {} [v{}]",
        stat.date, stat.earning, stat.spending, stat.version
    )
}

pub async fn run(ctx: &Context, command: Command) -> CliResult<()> {
    match command {
        Command::Account(account) => run_account(ctx, account.command).await,
        Command::Entry(entry) => run_entry(ctx, entry.command).await,
        Command::Stats(stats) => run_stats(ctx, stats.command).await,
        Command::Aggregates(aggregates) => run_aggregates(ctx, aggregates.command).await,
    }
}

async fn run_account(ctx: &Context, command: AccountCommand) -> CliResult<()> {
    match command {
        AccountCommand::Create(args) => {
            let currency = Currency::try_from(args.currency.as_str())?;
            let account = ctx
                .engine
                .new_account(args.owner, &args.title, args.description.as_deref(), currency)
                .await?;
            ctx.print(&account, describe_account)
        }
        AccountCommand::Show { id } => {
            let account = ctx.engine.account(id).await?;
            ctx.print(&account, describe_account)
        }
        AccountCommand::List(args) => {
            let accounts = ctx
                .engine
                .list_accounts(args.owner, &args.page.to_page())
                .await?;
            ctx.print(&accounts, |accounts| {
                accounts
                    .iter()
                    .map(describe_account)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        AccountCommand::Delete(args) => {
            ctx.engine.delete_account(args.id, args.owner).await?;
            tracing::info!(account_id = args.id, "account deleted");
            Ok(())
        }
    }
}

async fn run_entry(ctx: &Context, command: EntryCommand) -> CliResult<()> {
    match command {
        EntryCommand::Add(args) => {
            let entry = add_entry(ctx, &args).await?;
            ctx.print(&entry, describe_entry)
        }
        EntryCommand::Edit(args) => {
            let entry = edit_entry(ctx, &args).await?;
            ctx.print(&entry, describe_entry)
        }
        EntryCommand::Delete(args) => {
            let engine = &ctx.engine;
            let args = &args;
            retry_on_conflict(ctx.conflict_retries, || async move {
                let entry = engine.transaction(args.id).await?;
                let mut account = engine.account(entry.account_id).await?;
                let mut bucket = engine
                    .statistic_by_date(entry.account_id, entry.payday)
                    .await?;
                let entry = Transaction {
                    user_id: args.user,
                    ..entry
                };
                engine
                    .delete_transaction(&entry, &mut account, &mut bucket)
                    .await
            })
            .await?;
            tracing::info!(entry_id = args.id, "entry deleted");
            Ok(())
        }
        EntryCommand::Show { id } => {
            let entry = ctx.engine.transaction(id).await?;
            ctx.print(&entry, describe_entry)
        }
        EntryCommand::List(args) => {
            let entries = list_entries(ctx, &args).await?;
            ctx.print(&entries, |entries| {
                entries
                    .iter()
                    .map(describe_entry)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

async fn add_entry(ctx: &Context, args: &EntryAddArgs) -> CliResult<Transaction> {
    let engine = &ctx.engine;
    let entry = retry_on_conflict(ctx.conflict_retries, || async move {
        let mut account = engine.account(args.account).await?;
        let amount = Money::parse(&args.amount, account.currency)?;
        let mut bucket = engine.find_statistic(account.id, args.payday).await?;

        let mut draft = TransactionDraft::new(
            args.user,
            account.id,
            args.kind.into(),
            args.title.clone(),
            amount.minor(),
            args.payday,
        )
        .tags(args.tags.iter().cloned());
        if let Some(description) = &args.description {
            draft = draft.description(description.clone());
        }

        engine
            .create_transaction(draft, &mut account, &mut bucket)
            .await
    })
    .await?;
    Ok(entry)
}

async fn edit_entry(ctx: &Context, args: &EntryEditArgs) -> CliResult<Transaction> {
    let engine = &ctx.engine;
    let entry = retry_on_conflict(ctx.conflict_retries, || async move {
        let old = engine.user_transaction(args.id, args.user).await?;
        let mut account = engine.account(old.account_id).await?;
        let mut old_bucket = engine.statistic_by_date(old.account_id, old.payday).await?;

        let mut new = old.clone();
        if let Some(kind) = args.kind {
            new.kind = kind.into();
        }
        if let Some(title) = &args.title {
            new.title = title.clone();
        }
        if let Some(amount) = &args.amount {
            new.amount_minor = Money::parse(amount, account.currency)?.minor();
        }
        if let Some(payday) = args.payday {
            new.payday = payday;
        }
        if let Some(description) = &args.description {
            new.description = Some(description.clone());
        }
        if args.clear_tags {
            new.tags.clear();
        } else if !args.tags.is_empty() {
            new.tags = args.tags.iter().cloned().collect();
        }

        engine
            .update_transaction(&mut new, &old, &mut account, &mut old_bucket)
            .await?;
        Ok(new)
    })
    .await?;
    Ok(entry)
}

async fn list_entries(ctx: &Context, args: &EntryListArgs) -> CliResult<Vec<Transaction>> {
    let filter = TransactionListFilter::default()
        .title(args.title.clone())
        .tags(args.tags.iter().cloned())
        .between(args.from, args.to);
    let page = args.page.to_page();

    let entries = match args.account {
        Some(account_id) => {
            let account = ctx.engine.account(account_id).await?;
            if account.owner_id != args.user {
                return Err(format!("account {account_id} is not owned by user {}", args.user).into());
            }
            ctx.engine
                .list_account_transactions(account_id, &filter, &page)
                .await?
        }
        None => {
            let total = ctx.engine.count_transactions(args.user, &filter).await?;
            tracing::debug!(total, "matching entries");
            ctx.engine
                .list_transactions(args.user, &filter, &page)
                .await?
        }
    };
    Ok(entries)
}

async fn run_stats(ctx: &Context, command: StatsCommand) -> CliResult<()> {
    match command {
        StatsCommand::Range(args) => {
            if args.summary {
                let summary = ctx
                    .engine
                    .summarize_statistics(args.account, args.after, args.before)
                    .await?;
                return ctx.print(&summary, |s| {
                    format!(
                        "{} days: earning {}, spending {}, net {}",
                        s.days,
                        s.earning,
                        s.spending,
                        s.net()
                    )
                });
            }
            let buckets = ctx
                .engine
                .list_statistics(args.account, args.after, args.before)
                .await?;
            ctx.print(&buckets, |buckets| {
                buckets
                    .iter()
                    .map(describe_bucket)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

async fn run_aggregates(ctx: &Context, command: AggregatesCommand) -> CliResult<()> {
    let report = match command {
        AggregatesCommand::Verify { account } => ctx.engine.verify_aggregates(account).await?,
        AggregatesCommand::Recompute { account } => {
            ctx.engine.recompute_aggregates(account).await?
        }
    };
    ctx.print(&report, |report| {
        if report.is_consistent() {
            return format!(
                "account {}: {} entries, aggregates consistent",
                report.account_id, report.entries
            );
        }
        let mut lines = vec![format!(
            "account {}: totals stored {}/{} expected {}/{}",
            report.account_id,
            report.stored_income,
            report.stored_expense,
            report.expected_income,
            report.expected_expense
        )];
        lines.extend(report.buckets.iter().map(|drift| {
            format!(
                "  {} stored {}/{}{} expected {}/{}",
                drift.date,
                drift.stored_earning,
                drift.stored_spending,
                if drift.stored { "" } else { " (missing)" },
                drift.expected_earning,
                drift.expected_spending
            )
        }));
        lines.join("\n")
    })
}
