use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tally_engine::{
    paginate, Budget, BudgetForm, Category, CategoryForm, Expense, ExpenseForm, LoginForm,
    NotificationLevel, Page, RecurringExpense, RecurringExpenseForm, Session, TableQuery, User,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{read_state, write_state, ApiRequest, SharedState, Transport};

// ============================================================================
// Internal response types
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

// ============================================================================
// TallyClient
// ============================================================================

/// Typed wrapper over the Tally backend REST endpoints.
///
/// Forms are validated locally before anything is sent; an invalid form
/// never reaches the network.
pub struct TallyClient {
    transport: Transport,
    config: ClientConfig,
}

impl TallyClient {
    /// # Errors
    ///
    /// Fails only if the underlying HTTP client cannot be constructed.
    pub fn new(config: ClientConfig, state: SharedState) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let transport = Transport::new(http, config.base_url.clone(), state);
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &SharedState {
        self.transport.state()
    }

    /// Pass a result through, recording failures as an error toast with the
    /// raw message. Validation failures are shown inline instead.
    pub fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !matches!(e, ClientError::Validation(_)) {
                write_state(self.state()).push_notification(NotificationLevel::Error, e.to_string());
            }
        }
        result
    }

    fn require_session(&self) -> Result<()> {
        if read_state(self.state()).is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::NotAuthenticated)
        }
    }

    // --------------------------------------------------------------------
    // Auth
    // --------------------------------------------------------------------

    /// `POST /auth/login`. Validates the form, then caches tokens and user.
    pub async fn login(&self, form: &LoginForm) -> Result<Session> {
        let credentials = form.validate()?;
        // A 401 here is a wrong password, not an expired session
        let req = ApiRequest::post("/auth/login", &credentials)?.no_refresh();
        let resp: LoginResponse = self.transport.send_json(&req).await?;

        let session = Session {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
        };
        write_state(self.state()).sign_in(resp.user, session.clone());
        tracing::info!(email = %credentials.email, "logged in");
        Ok(session)
    }

    /// `POST /auth/logout`. The local session is cleared even if the call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = if read_state(self.state()).is_authenticated() {
            self.transport
                .send_ok(&ApiRequest::new(reqwest::Method::POST, "/auth/logout").no_refresh())
                .await
        } else {
            Ok(())
        };
        write_state(self.state()).clear();
        tracing::info!("logged out");
        if let Err(e) = &result {
            tracing::warn!(error = %e, "logout call failed, local session cleared anyway");
        }
        Ok(())
    }

    /// Resume from cached tokens without calling the backend.
    pub fn restore_session(&self, session: Session) {
        write_state(self.state()).sign_in(None, session);
    }

    /// `GET /auth/me`
    pub async fn me(&self) -> Result<User> {
        self.require_session()?;
        let user: User = self.transport.send_json(&ApiRequest::get("/auth/me")).await?;
        write_state(self.state()).set_user(user.clone());
        Ok(user)
    }

    // --------------------------------------------------------------------
    // Categories
    // --------------------------------------------------------------------

    /// `GET /categories`, also refreshing the cached category list.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.require_session()?;
        let categories: Vec<Category> = self
            .transport
            .send_json(&ApiRequest::get("/categories"))
            .await?;
        write_state(self.state()).set_categories(categories.clone());
        Ok(categories)
    }

    /// `POST /categories`
    pub async fn create_category(&self, form: &CategoryForm) -> Result<Category> {
        let body = form.validate()?;
        self.require_session()?;
        self.transport
            .send_json(&ApiRequest::post("/categories", &body)?)
            .await
    }

    // --------------------------------------------------------------------
    // Budgets
    // --------------------------------------------------------------------

    /// `GET /budgets`
    pub async fn list_budgets(&self) -> Result<Vec<Budget>> {
        self.require_session()?;
        self.transport.send_json(&ApiRequest::get("/budgets")).await
    }

    /// `POST /budgets`
    pub async fn create_budget(&self, form: &BudgetForm, today: NaiveDate) -> Result<Budget> {
        let body = form.validate(today)?;
        self.require_session()?;
        self.transport
            .send_json(&ApiRequest::post("/budgets", &body)?)
            .await
    }

    /// `PUT /budgets/:id`
    pub async fn update_budget(&self, id: &str, form: &BudgetForm, today: NaiveDate) -> Result<Budget> {
        let body = form.validate(today)?;
        self.require_session()?;
        self.transport
            .send_json(&ApiRequest::put(format!("/budgets/{id}"), &body)?)
            .await
    }

    /// `DELETE /budgets/:id`
    pub async fn delete_budget(&self, id: &str) -> Result<()> {
        self.require_session()?;
        self.transport
            .send_ok(&ApiRequest::delete(format!("/budgets/{id}")))
            .await
    }

    // --------------------------------------------------------------------
    // Expenses
    // --------------------------------------------------------------------

    /// `GET /expenses`
    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        self.require_session()?;
        self.transport.send_json(&ApiRequest::get("/expenses")).await
    }

    /// Fetch all expenses, then sort and page them locally.
    pub async fn expense_page(
        &self,
        query: &TableQuery<tally_engine::table::ExpenseColumn>,
    ) -> Result<Page<Expense>> {
        let expenses = self.list_expenses().await?;
        Ok(paginate(&expenses, query)?)
    }

    /// `POST /expenses`, stamped with `now`'s time of day in the configured zone.
    pub async fn create_expense(&self, form: &ExpenseForm, now: DateTime<Utc>) -> Result<Expense> {
        let body = form.validate(now, &self.config.timezone)?;
        self.require_session()?;
        self.transport
            .send_json(&ApiRequest::post("/expenses", &body)?)
            .await
    }

    /// `DELETE /expenses/:id`
    pub async fn delete_expense(&self, id: &str) -> Result<()> {
        self.require_session()?;
        self.transport
            .send_ok(&ApiRequest::delete(format!("/expenses/{id}")))
            .await
    }

    /// `GET /expenses/export`: CSV produced by the backend, returned verbatim.
    pub async fn export_expenses_csv(&self) -> Result<String> {
        self.require_session()?;
        self.transport
            .send_text(&ApiRequest::get("/expenses/export"))
            .await
    }

    // --------------------------------------------------------------------
    // Recurring expenses
    // --------------------------------------------------------------------

    /// `GET /recurring-expenses`
    pub async fn list_recurring(&self) -> Result<Vec<RecurringExpense>> {
        self.require_session()?;
        self.transport
            .send_json(&ApiRequest::get("/recurring-expenses"))
            .await
    }

    /// `POST /recurring-expenses`
    pub async fn create_recurring(
        &self,
        form: &RecurringExpenseForm,
        today: NaiveDate,
    ) -> Result<RecurringExpense> {
        let body = form.validate(today)?;
        self.require_session()?;
        self.transport
            .send_json(&ApiRequest::post("/recurring-expenses", &body)?)
            .await
    }

    /// `DELETE /recurring-expenses/:id`
    pub async fn delete_recurring(&self, id: &str) -> Result<()> {
        self.require_session()?;
        self.transport
            .send_ok(&ApiRequest::delete(format!("/recurring-expenses/{id}")))
            .await
    }

    // --------------------------------------------------------------------
    // Overview
    // --------------------------------------------------------------------

    /// `GET /overview`: aggregated by the backend and passed through uninterpreted.
    pub async fn overview(&self) -> Result<serde_json::Value> {
        self.require_session()?;
        self.transport.send_json(&ApiRequest::get("/overview")).await
    }
}
