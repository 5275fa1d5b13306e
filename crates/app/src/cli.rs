use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::TransactionKind;

#[derive(Parser, Debug)]
#[command(name = "spendbook")]
#[command(about = "Personal finance ledger with per-account totals and daily statistics")]
pub struct Cli {
    /// Database connection string, overrides the configured database.
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage accounts.
    Account(Account),
    /// Record and edit ledger entries.
    Entry(Entry),
    /// Read daily statistic buckets.
    Stats(Stats),
    /// Check or rebuild the aggregates of an account from its ledger.
    Aggregates(Aggregates),
}

#[derive(Args, Debug)]
pub struct Account {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    Create(AccountCreateArgs),
    Show { id: i64 },
    List(AccountListArgs),
    Delete(AccountDeleteArgs),
}

#[derive(Args, Debug)]
pub struct AccountCreateArgs {
    #[arg(long)]
    pub owner: i64,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, default_value = "EUR")]
    pub currency: String,
}

#[derive(Args, Debug)]
pub struct AccountListArgs {
    #[arg(long)]
    pub owner: i64,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct AccountDeleteArgs {
    pub id: i64,
    #[arg(long)]
    pub owner: i64,
}

#[derive(Args, Debug)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u64,
    #[arg(long, default_value_t = 20)]
    pub limit: u64,
    /// Sort key, prefixed with `-` for descending order.
    #[arg(long, default_value = "id", allow_hyphen_values = true)]
    pub sort: String,
}

impl PageArgs {
    pub fn to_page(&self) -> engine::Page {
        engine::Page::new(self.page, self.limit).sort(self.sort.clone())
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for TransactionKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Income => TransactionKind::Income,
            KindArg::Expense => TransactionKind::Expense,
        }
    }
}

#[derive(Args, Debug)]
pub struct Entry {
    #[command(subcommand)]
    pub command: EntryCommand,
}

#[derive(Subcommand, Debug)]
pub enum EntryCommand {
    Add(EntryAddArgs),
    Edit(EntryEditArgs),
    Delete(EntryDeleteArgs),
    Show { id: i64 },
    List(EntryListArgs),
}

#[derive(Args, Debug)]
pub struct EntryAddArgs {
    #[arg(long)]
    pub user: i64,
    #[arg(long)]
    pub account: i64,
    #[arg(long, value_enum)]
    pub kind: KindArg,
    #[arg(long)]
    pub title: String,
    /// Decimal amount in the account currency, e.g. `12.50`.
    #[arg(long)]
    pub amount: String,
    #[arg(long)]
    pub payday: NaiveDate,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EntryEditArgs {
    pub id: i64,
    #[arg(long)]
    pub user: i64,
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub amount: Option<String>,
    #[arg(long)]
    pub payday: Option<NaiveDate>,
    #[arg(long)]
    pub description: Option<String>,
    /// Replaces the tags of the entry.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
}

#[derive(Args, Debug)]
pub struct EntryDeleteArgs {
    pub id: i64,
    #[arg(long)]
    pub user: i64,
}

#[derive(Args, Debug)]
pub struct EntryListArgs {
    #[arg(long)]
    pub user: i64,
    /// Only list the entries of this account.
    #[arg(long)]
    pub account: Option<i64>,
    #[arg(long, default_value = "")]
    pub title: String,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// First payday included.
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// First payday excluded.
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct Stats {
    #[command(subcommand)]
    pub command: StatsCommand,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommand {
    /// Buckets with `after <= date < before`.
    Range(StatsRangeArgs),
}

#[derive(Args, Debug)]
pub struct StatsRangeArgs {
    #[arg(long)]
    pub account: i64,
    #[arg(long)]
    pub after: NaiveDate,
    #[arg(long)]
    pub before: NaiveDate,
    /// Print only the totals of the range.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug)]
pub struct Aggregates {
    #[command(subcommand)]
    pub command: AggregatesCommand,
}

#[derive(Subcommand, Debug)]
pub enum AggregatesCommand {
    Verify { account: i64 },
    Recompute { account: i64 },
}
