//! # tally-engine
//!
//! Deterministic client-side logic for the Tally personal-finance tracker.
//!
//! The backend owns persistence, authentication and every piece of budget
//! math. What stays on the client is small but has exact rules: which dates a
//! budget form pre-fills for a period, when a recurring expense may start,
//! how dates go over the wire, and when a failed call is retried after a
//! token refresh. Nothing here reads the clock or touches the network.
//!
//! ## Modules
//!
//! - [`period`] — Period/recurrence enums, `DateRange`, budget range resolution
//! - [`validation`] — Form validation into request payloads, recurring start-date rule
//! - [`wire`] — Request payloads and day-vs-timestamp date formatting
//! - [`models`] — Backend entities as read by the client
//! - [`table`] — Client-side sorting and pagination
//! - [`refresh`] — Retry-once-after-refresh state machine
//! - [`state`] — Session-scoped application state with logout reset
//! - [`error`] — Error types

pub mod error;
pub mod models;
pub mod period;
pub mod refresh;
pub mod state;
pub mod table;
pub mod validation;
pub mod wire;

pub use error::EngineError;
pub use models::{Budget, Category, Expense, RecurringExpense, User};
pub use period::{
    next_occurrence, prefill_range, resolve_range, resolve_range_with_options, DateRange, Period,
    Recurrence, ResolveOptions, WeekStartDay,
};
pub use refresh::{FlowState, RefreshFlow, Step};
pub use state::{AppState, Notification, NotificationLevel, Session, Theme};
pub use table::{paginate, Page, Sort, SortOrder, Sortable, TableQuery};
pub use validation::{
    validate_start, BudgetForm, CategoryForm, ExpenseForm, FormErrors, LoginForm,
    RecurringExpenseForm, ValidationError,
};
pub use wire::{
    expense_timestamp, format_day, format_timestamp, parse_day, parse_timezone, BudgetPayload,
    Credentials, NewCategory, NewExpense, NewRecurringExpense,
};
