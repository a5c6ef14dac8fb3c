//! Commands that talk to the backend through a cached session.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tally_client::{ClientConfig, SessionCache, SharedState, TallyClient};
use tally_engine::table::ExpenseColumn;
use tally_engine::{
    AppState, BudgetForm, CategoryForm, ExpenseForm, LoginForm, RecurringExpenseForm, Sort,
    SortOrder, TableQuery,
};

use crate::{
    BudgetArgs, BudgetCommand, CategoryCommand, ExpenseCommand, ExpenseSort, GlobalOpts,
    RecurringCommand,
};

pub struct Remote {
    client: TallyClient,
    cache: SessionCache,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl From<ExpenseSort> for ExpenseColumn {
    fn from(value: ExpenseSort) -> Self {
        match value {
            ExpenseSort::Date => ExpenseColumn::Date,
            ExpenseSort::Amount => ExpenseColumn::Amount,
            ExpenseSort::Category => ExpenseColumn::Category,
            ExpenseSort::Description => ExpenseColumn::Description,
        }
    }
}

impl Remote {
    /// Build a client from env plus flag overrides and resume any cached session.
    pub fn connect(opts: &GlobalOpts) -> Result<Self> {
        let config = ClientConfig::from_lookup(|key: &str| opts.lookup(key))?;

        let cache = match &opts.session_file {
            Some(path) => SessionCache::new(path.clone()),
            None => SessionCache::default_location()?,
        };

        let state: SharedState = Arc::new(RwLock::new(AppState::new()));
        let client = TallyClient::new(config, state)?;
        if let Some(session) = cache.load()? {
            tracing::debug!(path = %cache.path().display(), "resuming cached session");
            client.restore_session(session);
        }
        Ok(Self { client, cache })
    }

    /// Same zone as [`GlobalOpts::today`], taken from the built config.
    fn today(&self) -> NaiveDate {
        Utc::now()
            .with_timezone(&self.client.config().timezone)
            .date_naive()
    }

    /// Mirror the in-memory session to disk: refreshed tokens are kept, an
    /// expired session removes the cache file.
    fn persist(&self) -> Result<()> {
        let session = self
            .client
            .state()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .session()
            .cloned();
        match session {
            Some(session) => self.cache.store(&session)?,
            None => self.cache.clear()?,
        }
        Ok(())
    }

    /// Persist, then turn login-related failures into a hint.
    fn finish<T>(&self, result: tally_client::Result<T>) -> Result<T> {
        self.persist()?;
        result.map_err(|e| {
            if e.needs_login() {
                anyhow::anyhow!("{e} (run `tally login`)")
            } else {
                e.into()
            }
        })
    }

    pub async fn login(&self, email: String, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(p) => p,
            None => read_password()?,
        };
        let form = LoginForm { email, password };
        let result = self.client.login(&form).await;
        self.finish(result)?;
        eprintln!("Logged in as {}", form.email);
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        let result = self.client.logout().await;
        self.finish(result)?;
        eprintln!("Logged out");
        Ok(())
    }

    pub async fn whoami(&self) -> Result<()> {
        let result = self.client.me().await;
        print_json(&self.finish(result)?)
    }

    pub async fn budgets(&self, cmd: BudgetCommand) -> Result<()> {
        match cmd {
            BudgetCommand::List => {
                let result = self.client.list_budgets().await;
                print_json(&self.finish(result)?)
            }
            BudgetCommand::Add(args) => {
                let form = self.budget_form(args);
                let result = self.client.create_budget(&form, self.today()).await;
                print_json(&self.finish(result)?)
            }
            BudgetCommand::Update { id, budget } => {
                let form = self.budget_form(budget);
                let result = self.client.update_budget(&id, &form, self.today()).await;
                print_json(&self.finish(result)?)
            }
            BudgetCommand::Delete { id } => {
                let result = self.client.delete_budget(&id).await;
                self.finish(result)?;
                eprintln!("Deleted budget {id}");
                Ok(())
            }
        }
    }

    /// Pre-fill dates from the period the way the budget form does, then apply
    /// any explicit dates on top.
    fn budget_form(&self, args: BudgetArgs) -> BudgetForm {
        let mut form = BudgetForm {
            category: args.category,
            amount_limit: args.amount,
            ..Default::default()
        };
        form.select_period(args.period, self.today());
        if args.start.is_some() {
            form.start_date = args.start;
        }
        if args.end.is_some() {
            form.end_date = args.end;
        }
        form
    }

    pub async fn expenses(&self, cmd: ExpenseCommand) -> Result<()> {
        match cmd {
            ExpenseCommand::List {
                page,
                page_size,
                sort,
                desc,
            } => {
                let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
                let query = TableQuery {
                    page: usize::try_from(page - 1).context("page out of range")?,
                    page_size: usize::try_from(page_size).context("page size out of range")?,
                    sort: sort.map(|column| Sort {
                        column: column.into(),
                        order,
                    }),
                };
                let result = self.client.expense_page(&query).await;
                print_json(&self.finish(result)?)
            }
            ExpenseCommand::Add {
                category,
                amount,
                date,
                description,
            } => {
                let form = ExpenseForm {
                    category,
                    amount,
                    description,
                    date: Some(date.unwrap_or_else(|| self.today())),
                };
                let result = self.client.create_expense(&form, Utc::now()).await;
                print_json(&self.finish(result)?)
            }
            ExpenseCommand::Delete { id } => {
                let result = self.client.delete_expense(&id).await;
                self.finish(result)?;
                eprintln!("Deleted expense {id}");
                Ok(())
            }
            ExpenseCommand::Export { output } => {
                let result = self.client.export_expenses_csv().await;
                let csv = self.finish(result)?;
                match output {
                    Some(path) => {
                        std::fs::write(&path, csv)
                            .with_context(|| format!("writing {}", path.display()))?;
                        eprintln!("Exported expenses to {}", path.display());
                    }
                    None => io::stdout().write_all(csv.as_bytes())?,
                }
                Ok(())
            }
        }
    }

    pub async fn recurring(&self, cmd: RecurringCommand) -> Result<()> {
        match cmd {
            RecurringCommand::List => {
                let result = self.client.list_recurring().await;
                print_json(&self.finish(result)?)
            }
            RecurringCommand::Add {
                category,
                amount,
                recurrence,
                date,
                description,
            } => {
                let form = RecurringExpenseForm {
                    category,
                    amount,
                    description,
                    recurrence: Some(recurrence),
                    date: Some(date),
                };
                let result = self.client.create_recurring(&form, self.today()).await;
                print_json(&self.finish(result)?)
            }
            RecurringCommand::Delete { id } => {
                let result = self.client.delete_recurring(&id).await;
                self.finish(result)?;
                eprintln!("Deleted recurring expense {id}");
                Ok(())
            }
        }
    }

    pub async fn categories(&self, cmd: CategoryCommand) -> Result<()> {
        match cmd {
            CategoryCommand::List => {
                let result = self.client.list_categories().await;
                print_json(&self.finish(result)?)
            }
            CategoryCommand::Add { name } => {
                let result = self.client.create_category(&CategoryForm { name }).await;
                print_json(&self.finish(result)?)
            }
        }
    }

    pub async fn overview(&self) -> Result<()> {
        let result = self.client.overview().await;
        print_json(&self.finish(result)?)
    }
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
