mod logging;
mod offline;
mod remote;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tally_client::config::{ENV_API_URL, ENV_TIMEZONE};
use tally_client::ClientConfig;
use tally_engine::{Period, Recurrence, WeekStartDay};

/// Tally: budgets, expenses and recurring expenses from the terminal.
#[derive(Parser, Debug)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Backend base URL. Overrides TALLY_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// IANA timezone for expense timestamps. Overrides TALLY_TIMEZONE.
    #[arg(long, global = true)]
    pub timezone: Option<String>,

    /// Where the session tokens are cached.
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Debug logging for the tally crates on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl GlobalOpts {
    /// Configuration lookup: flags win over the environment.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let flag = match key {
            ENV_API_URL => self.api_url.clone(),
            ENV_TIMEZONE => self.timezone.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    }

    /// Today's date in the configured timezone, shared by every command.
    pub fn today(&self) -> Result<NaiveDate> {
        let tz = ClientConfig::timezone_from_lookup(|key: &str| self.lookup(key))?;
        Ok(Utc::now().with_timezone(&tz).date_naive())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the date range a budget period covers.
    Period {
        period: Period,
        /// Anchor date (defaults to today in the configured timezone).
        #[arg(long)]
        today: Option<NaiveDate>,
        /// Overrides the pre-filled start date; required for CUSTOM.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Overrides the pre-filled end date; required for CUSTOM.
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = WeekStart::Sunday)]
        week_start: WeekStart,
    },
    /// Check whether a recurring expense may start on DATE.
    CheckStart {
        date: NaiveDate,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Preview upcoming occurrences of a recurring expense.
    Next {
        recurrence: Recurrence,
        from: NaiveDate,
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Log in and cache the session.
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and drop the cached session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    #[command(subcommand)]
    Budgets(BudgetCommand),
    #[command(subcommand)]
    Expenses(ExpenseCommand),
    #[command(subcommand)]
    Recurring(RecurringCommand),
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Print the backend's spending overview.
    Overview,
}

#[derive(Args, Debug, Clone)]
pub struct BudgetArgs {
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub amount: String,
    #[arg(long)]
    pub period: Period,
    /// Overrides the pre-filled start date; required for CUSTOM.
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Overrides the pre-filled end date; required for CUSTOM.
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
pub enum BudgetCommand {
    List,
    Add(BudgetArgs),
    Update {
        id: String,
        #[command(flatten)]
        budget: BudgetArgs,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    List {
        /// 1-based page number.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        page: u64,
        #[arg(long, default_value_t = tally_engine::table::DEFAULT_PAGE_SIZE as u64,
              value_parser = clap::value_parser!(u64).range(1..))]
        page_size: u64,
        #[arg(long, value_enum)]
        sort: Option<ExpenseSort>,
        #[arg(long, default_value_t = false)]
        desc: bool,
    },
    Add {
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: String,
        /// Calendar date of the expense (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete { id: String },
    /// Write the backend's CSV export to stdout or a file.
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecurringCommand {
    List,
    Add {
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        recurrence: Recurrence,
        /// First occurrence; must be tomorrow or later.
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    List,
    Add { name: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStart {
    Sunday,
    Monday,
}

impl From<WeekStart> for WeekStartDay {
    fn from(value: WeekStart) -> Self {
        match value {
            WeekStart::Sunday => WeekStartDay::Sunday,
            WeekStart::Monday => WeekStartDay::Monday,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseSort {
    Date,
    Amount,
    Category,
    Description,
}

fn resolve_today(explicit: Option<NaiveDate>, opts: &GlobalOpts) -> Result<NaiveDate> {
    match explicit {
        Some(today) => Ok(today),
        None => opts.today(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Period {
            period,
            today,
            start,
            end,
            week_start,
        } => {
            let today = resolve_today(today, &cli.global)?;
            offline::period(period, today, start, end, week_start.into())
        }
        Command::CheckStart { date, today } => {
            offline::check_start(date, resolve_today(today, &cli.global)?)
        }
        Command::Next {
            recurrence,
            from,
            count,
        } => offline::next(recurrence, from, count),

        Command::Login { email, password } => {
            remote::Remote::connect(&cli.global)?
                .login(email, password)
                .await
        }
        Command::Logout => remote::Remote::connect(&cli.global)?.logout().await,
        Command::Whoami => remote::Remote::connect(&cli.global)?.whoami().await,
        Command::Budgets(cmd) => remote::Remote::connect(&cli.global)?.budgets(cmd).await,
        Command::Expenses(cmd) => remote::Remote::connect(&cli.global)?.expenses(cmd).await,
        Command::Recurring(cmd) => remote::Remote::connect(&cli.global)?.recurring(cmd).await,
        Command::Categories(cmd) => remote::Remote::connect(&cli.global)?.categories(cmd).await,
        Command::Overview => remote::Remote::connect(&cli.global)?.overview().await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.global.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
