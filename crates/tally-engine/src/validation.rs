//! Form collection and validation.
//!
//! Each form holds raw user input and turns into a typed request payload
//! only when every field is valid. Errors are collected per field so a UI
//! can show them all inline at once.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::{prefill_range, resolve_range, DateRange, Period, Recurrence};
use crate::wire::{
    expense_timestamp, BudgetPayload, Credentials, NewCategory, NewExpense, NewRecurringExpense,
};

pub const START_DATE_MESSAGE: &str = "Start date must be tomorrow or later";

// ── Errors ──────────────────────────────────────────────────────────────────

/// A single field-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors of one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(Vec<ValidationError>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// First message reported for `field`, for inline display.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Record the error, if any, and hand back the value.
    fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&joined.join("; "))
    }
}

impl std::error::Error for FormErrors {}

impl From<ValidationError> for FormErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

// ── Field rules ─────────────────────────────────────────────────────────────

/// Reject a recurring-expense start date earlier than tomorrow.
///
/// Comparison is at day granularity: both inputs are calendar dates, so any
/// time of day has already been discarded. `today` itself is rejected.
///
/// # Errors
///
/// Returns a `date` field error with [`START_DATE_MESSAGE`].
pub fn validate_start(candidate: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    match today.succ_opt() {
        Some(tomorrow) if candidate >= tomorrow => Ok(()),
        _ => Err(ValidationError::new("date", START_DATE_MESSAGE)),
    }
}

pub fn require_non_empty(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "This field is required"));
    }
    Ok(trimmed.to_string())
}

/// Parse a strictly positive money amount.
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(field, "Amount is required"));
    }
    let amount = Decimal::from_str(raw)
        .map_err(|_| ValidationError::new(field, "Amount must be a number"))?;
    if amount <= Decimal::ZERO {
        return Err(ValidationError::new(field, "Amount must be greater than zero"));
    }
    Ok(amount)
}

fn require<T>(field: &str, value: Option<T>, message: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, message))
}

// ── Budget form ─────────────────────────────────────────────────────────────

/// Shared by the add-budget and edit-budget screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetForm {
    pub category: String,
    pub amount_limit: String,
    pub period: Option<Period>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BudgetForm {
    /// Apply a period selection, pre-filling the dates unless it is `CUSTOM`.
    pub fn select_period(&mut self, period: Period, today: NaiveDate) {
        self.period = Some(period);
        let current = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => DateRange::new(start, end).ok(),
            _ => None,
        };
        if let Some(range) = prefill_range(period, today, current) {
            self.start_date = Some(range.start());
            self.end_date = Some(range.end());
        }
    }

    /// Validate into a request body.
    ///
    /// Missing dates of a non-custom period fall back to the resolved default
    /// for `today`; a custom period needs both dates from the user.
    pub fn validate(&self, today: NaiveDate) -> Result<BudgetPayload, FormErrors> {
        let mut errors = FormErrors::default();

        let category = errors.check(require_non_empty("category", &self.category));
        let amount_limit = errors.check(parse_amount("amountLimit", &self.amount_limit));
        let period = errors.check(require("period", self.period, "Period is required"));

        let defaults = period.and_then(|p| resolve_range(p, today));
        let start = self.start_date.or(defaults.map(|r| r.start()));
        let end = self.end_date.or(defaults.map(|r| r.end()));
        let start = errors.check(require("startDate", start, "Start date is required"));
        let end = errors.check(require("endDate", end, "End date is required"));

        let range = match (start, end) {
            (Some(start), Some(end)) => errors.check(DateRange::new(start, end).map_err(|_| {
                ValidationError::new("endDate", "End date must be on or after the start date")
            })),
            _ => None,
        };

        match (category, amount_limit, period, range) {
            (Some(category), Some(amount_limit), Some(period), Some(range)) if errors.is_empty() => {
                Ok(BudgetPayload {
                    category,
                    amount_limit,
                    period,
                    start_date: range.start(),
                    end_date: range.end(),
                })
            }
            _ => Err(errors),
        }
    }
}

// ── Expense form ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseForm {
    pub category: String,
    pub amount: String,
    #[serde(default)]
    pub description: String,
    pub date: Option<NaiveDate>,
}

impl ExpenseForm {
    /// Validate into a request body stamped with `now`'s local time of day in `tz`.
    pub fn validate(&self, now: DateTime<Utc>, tz: &Tz) -> Result<NewExpense, FormErrors> {
        let mut errors = FormErrors::default();

        let category = errors.check(require_non_empty("category", &self.category));
        let amount = errors.check(parse_amount("amount", &self.amount));
        let date = errors
            .check(require("date", self.date, "Date is required"))
            .and_then(|date| {
                errors.check(
                    expense_timestamp(date, now, tz)
                        .map_err(|e| ValidationError::new("date", e.to_string())),
                )
            });

        match (category, amount, date) {
            (Some(category), Some(amount), Some(date)) if errors.is_empty() => Ok(NewExpense {
                category,
                amount,
                description: self.description.trim().to_string(),
                date,
            }),
            _ => Err(errors),
        }
    }
}

// ── Recurring expense form ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpenseForm {
    pub category: String,
    pub amount: String,
    #[serde(default)]
    pub description: String,
    pub recurrence: Option<Recurrence>,
    pub date: Option<NaiveDate>,
}

impl RecurringExpenseForm {
    pub fn validate(&self, today: NaiveDate) -> Result<NewRecurringExpense, FormErrors> {
        let mut errors = FormErrors::default();

        let category = errors.check(require_non_empty("category", &self.category));
        let amount = errors.check(parse_amount("amount", &self.amount));
        let recurrence = errors.check(require(
            "recurrence",
            self.recurrence,
            "Recurrence is required",
        ));
        let date = errors
            .check(require("date", self.date, "Start date is required"))
            .and_then(|date| errors.check(validate_start(date, today).map(|()| date)));

        match (category, amount, recurrence, date) {
            (Some(category), Some(amount), Some(recurrence), Some(date)) if errors.is_empty() => {
                Ok(NewRecurringExpense {
                    category,
                    amount,
                    description: self.description.trim().to_string(),
                    recurrence,
                    date,
                })
            }
            _ => Err(errors),
        }
    }
}

// ── Category / login forms ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<NewCategory, FormErrors> {
        let name = require_non_empty("name", &self.name)?;
        Ok(NewCategory { name })
    }
}

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials, FormErrors> {
        let mut errors = FormErrors::default();

        let email = errors
            .check(require_non_empty("email", &self.email))
            .and_then(|email| {
                let well_formed = email
                    .split_once('@')
                    .is_some_and(|(user, host)| !user.is_empty() && !host.is_empty());
                if well_formed {
                    Some(email)
                } else {
                    errors.push(ValidationError::new("email", "Enter a valid email address"));
                    None
                }
            });
        if self.password.is_empty() {
            errors.push(ValidationError::new("password", "This field is required"));
        }

        match email {
            Some(email) if errors.is_empty() => Ok(Credentials {
                email,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // ── validate_start ──────────────────────────────────────────────────

    #[test]
    fn test_start_today_is_rejected() {
        let today = d(2024, 3, 15);
        let err = validate_start(today, today).unwrap_err();
        assert_eq!(err.field, "date");
        assert_eq!(err.message, "Start date must be tomorrow or later");
    }

    #[test]
    fn test_start_tomorrow_and_later_accepted() {
        let today = d(2024, 3, 15);
        assert!(validate_start(d(2024, 3, 16), today).is_ok());
        assert!(validate_start(d(2024, 3, 17), today).is_ok());
    }

    #[test]
    fn test_start_in_past_is_rejected() {
        assert!(validate_start(d(2024, 3, 1), d(2024, 3, 15)).is_err());
    }

    #[test]
    fn test_start_across_year_end() {
        assert!(validate_start(d(2025, 1, 1), d(2024, 12, 31)).is_ok());
    }

    // ── amounts ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("amount", " 12.50 ").unwrap(), Decimal::new(1250, 2));
        assert_eq!(
            parse_amount("amount", "").unwrap_err().message,
            "Amount is required"
        );
        assert_eq!(
            parse_amount("amount", "abc").unwrap_err().message,
            "Amount must be a number"
        );
        assert_eq!(
            parse_amount("amount", "-3").unwrap_err().message,
            "Amount must be greater than zero"
        );
        assert!(parse_amount("amount", "0").is_err());
    }

    // ── budget form ─────────────────────────────────────────────────────

    fn budget_form() -> BudgetForm {
        BudgetForm {
            category: "groceries".into(),
            amount_limit: "400".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_budget_select_period_prefills() {
        let mut form = budget_form();
        form.select_period(Period::Weekly, d(2024, 3, 15));
        assert_eq!(form.start_date, Some(d(2024, 3, 10)));
        assert_eq!(form.end_date, Some(d(2024, 3, 16)));

        form.select_period(Period::Yearly, d(2024, 3, 15));
        assert_eq!(form.start_date, Some(d(2024, 1, 1)));
        assert_eq!(form.end_date, Some(d(2024, 12, 31)));
    }

    #[test]
    fn test_budget_switch_to_custom_keeps_dates() {
        let mut form = budget_form();
        form.select_period(Period::Monthly, d(2024, 2, 20));
        form.select_period(Period::Custom, d(2024, 2, 20));
        assert_eq!(form.period, Some(Period::Custom));
        assert_eq!(form.start_date, Some(d(2024, 2, 1)));
        assert_eq!(form.end_date, Some(d(2024, 2, 29)));
    }

    #[test]
    fn test_budget_defaults_dates_for_fixed_period() {
        let mut form = budget_form();
        form.period = Some(Period::Monthly);
        let payload = form.validate(d(2023, 2, 20)).unwrap();
        assert_eq!(payload.start_date, d(2023, 2, 1));
        assert_eq!(payload.end_date, d(2023, 2, 28));
        assert_eq!(payload.amount_limit, Decimal::from(400));
    }

    #[test]
    fn test_budget_custom_requires_dates() {
        let mut form = budget_form();
        form.period = Some(Period::Custom);
        let errors = form.validate(d(2024, 1, 1)).unwrap_err();
        assert_eq!(errors.message_for("startDate"), Some("Start date is required"));
        assert_eq!(errors.message_for("endDate"), Some("End date is required"));
    }

    #[test]
    fn test_budget_custom_inverted_range() {
        let mut form = budget_form();
        form.period = Some(Period::Custom);
        form.start_date = Some(d(2024, 5, 1));
        form.end_date = Some(d(2024, 4, 1));
        let errors = form.validate(d(2024, 1, 1)).unwrap_err();
        assert_eq!(
            errors.message_for("endDate"),
            Some("End date must be on or after the start date")
        );
    }

    #[test]
    fn test_budget_collects_all_errors() {
        let errors = BudgetForm::default().validate(d(2024, 1, 1)).unwrap_err();
        assert!(errors.message_for("category").is_some());
        assert!(errors.message_for("amountLimit").is_some());
        assert!(errors.message_for("period").is_some());
    }

    // ── expense form ────────────────────────────────────────────────────

    #[test]
    fn test_expense_form_builds_timestamp() {
        let form = ExpenseForm {
            category: "coffee".into(),
            amount: "4.75".into(),
            description: "  flat white ".into(),
            date: Some(d(2024, 3, 14)),
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        let payload = form.validate(now, &Tz::UTC).unwrap();
        assert_eq!(payload.date, Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap());
        assert_eq!(payload.description, "flat white");
    }

    #[test]
    fn test_expense_form_missing_date() {
        let form = ExpenseForm {
            category: "coffee".into(),
            amount: "4.75".into(),
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        let errors = form.validate(now, &Tz::UTC).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.message_for("date"), Some("Date is required"));
    }

    // ── recurring form ──────────────────────────────────────────────────

    #[test]
    fn test_recurring_form_rejects_today() {
        let today = d(2024, 3, 15);
        let form = RecurringExpenseForm {
            category: "rent".into(),
            amount: "1200".into(),
            recurrence: Some(Recurrence::Monthly),
            date: Some(today),
            ..Default::default()
        };
        let errors = form.validate(today).unwrap_err();
        assert_eq!(errors.message_for("date"), Some(START_DATE_MESSAGE));
    }

    #[test]
    fn test_recurring_form_accepts_tomorrow() {
        let form = RecurringExpenseForm {
            category: "rent".into(),
            amount: "1200".into(),
            recurrence: Some(Recurrence::Monthly),
            date: Some(d(2024, 3, 16)),
            ..Default::default()
        };
        let payload = form.validate(d(2024, 3, 15)).unwrap();
        assert_eq!(payload.date, d(2024, 3, 16));
        assert_eq!(payload.recurrence, Recurrence::Monthly);
    }

    // ── login / category ────────────────────────────────────────────────

    #[test]
    fn test_login_form() {
        let ok = LoginForm {
            email: " me@example.com ".into(),
            password: "pw".into(),
        };
        assert_eq!(ok.validate().unwrap().email, "me@example.com");

        let bad = LoginForm {
            email: "nope".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.message_for("email"), Some("Enter a valid email address"));
        assert_eq!(errors.message_for("password"), Some("This field is required"));
    }

    #[test]
    fn test_category_form() {
        assert!(CategoryForm { name: "  ".into() }.validate().is_err());
        assert_eq!(
            CategoryForm { name: "Travel".into() }.validate().unwrap().name,
            "Travel"
        );
    }

    #[test]
    fn test_form_errors_display() {
        let mut errors = FormErrors::default();
        errors.push(ValidationError::new("a", "x"));
        errors.push(ValidationError::new("b", "y"));
        assert_eq!(errors.to_string(), "a: x; b: y");
    }
}
