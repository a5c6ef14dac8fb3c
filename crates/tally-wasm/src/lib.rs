//! WASM bindings for the browser budget and expense forms.
//!
//! Dates cross the boundary as `YYYY-MM-DD` strings and structured values as
//! JSON strings. Each export is a thin wrapper over a plain Rust function so
//! the logic is testable natively.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tally_engine::{
    expense_timestamp, format_day, format_timestamp, next_occurrence, parse_day, parse_timezone,
    prefill_range, resolve_range_with_options, validate_start, BudgetForm, DateRange, EngineError,
    ExpenseForm, FormErrors, Period, Recurrence, RecurringExpenseForm, ResolveOptions,
    ValidationError, WeekStartDay,
};
use wasm_bindgen::prelude::*;

#[derive(Debug, thiserror::Error)]
enum BindingError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Field(#[from] ValidationError),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, BindingError>;
type JsResult<T> = std::result::Result<T, JsError>;

fn day(s: &str) -> Result<NaiveDate> {
    Ok(parse_day(s)?)
}

fn range_json(range: Option<DateRange>) -> String {
    match range {
        Some(range) => json!({
            "startDate": format_day(range.start()),
            "endDate": format_day(range.end()),
        })
        .to_string(),
        None => "null".to_string(),
    }
}

// ── Periods ─────────────────────────────────────────────────────────────────

fn resolve_range_impl(period: &str, today: &str, monday_first: bool) -> Result<String> {
    let period: Period = period.parse()?;
    let options = ResolveOptions {
        week_start: if monday_first {
            WeekStartDay::Monday
        } else {
            WeekStartDay::Sunday
        },
    };
    Ok(range_json(resolve_range_with_options(
        period,
        day(today)?,
        &options,
    )))
}

fn prefill_range_impl(
    period: &str,
    today: &str,
    start: Option<String>,
    end: Option<String>,
) -> Result<String> {
    let period: Period = period.parse()?;
    let current = match (start, end) {
        (Some(start), Some(end)) => Some(DateRange::new(day(&start)?, day(&end)?)?),
        _ => None,
    };
    Ok(range_json(prefill_range(period, day(today)?, current)))
}

/// `{"startDate", "endDate"}` for a period anchored at `today`, or `null` for
/// `CUSTOM`.
#[wasm_bindgen(js_name = resolveRange)]
pub fn resolve_range(period: &str, today: &str, monday_first: Option<bool>) -> JsResult<String> {
    Ok(resolve_range_impl(period, today, monday_first.unwrap_or(false))?)
}

/// Dates to show after the period dropdown changes. A `CUSTOM` selection
/// keeps the dates already entered.
#[wasm_bindgen(js_name = prefillRange)]
pub fn prefill(
    period: &str,
    today: &str,
    start: Option<String>,
    end: Option<String>,
) -> JsResult<String> {
    Ok(prefill_range_impl(period, today, start, end)?)
}

// ── Recurring start date ────────────────────────────────────────────────────

fn start_date_error_impl(candidate: &str, today: &str) -> Result<Option<String>> {
    let outcome = validate_start(day(candidate)?, day(today)?);
    Ok(outcome.err().map(|e| e.message))
}

/// Inline error message for the recurring start date, or `undefined` if valid.
#[wasm_bindgen(js_name = startDateError)]
pub fn start_date_error(candidate: &str, today: &str) -> JsResult<Option<String>> {
    Ok(start_date_error_impl(candidate, today)?)
}

fn validate_start_impl(candidate: &str, today: &str) -> Result<()> {
    validate_start(day(candidate)?, day(today)?)?;
    Ok(())
}

/// Throws unless `candidate` is tomorrow or later.
#[wasm_bindgen(js_name = validateStart)]
pub fn validate_start_date(candidate: &str, today: &str) -> JsResult<()> {
    Ok(validate_start_impl(candidate, today)?)
}

fn next_occurrence_impl(recurrence: &str, from: &str) -> Result<String> {
    let recurrence: Recurrence = recurrence.parse()?;
    let from = day(from)?;
    let next = next_occurrence(recurrence, from).ok_or_else(|| {
        EngineError::InvalidArgument(format!("no {recurrence} occurrence after {from}"))
    })?;
    Ok(format_day(next))
}

#[wasm_bindgen(js_name = nextOccurrence)]
pub fn next(recurrence: &str, from: &str) -> JsResult<String> {
    Ok(next_occurrence_impl(recurrence, from)?)
}

// ── Forms ───────────────────────────────────────────────────────────────────

/// `{"ok": true, "payload": {...}}` or `{"ok": false, "errors": [{"field", "message"}]}`.
///
/// Field errors are data, not exceptions; only malformed input throws.
fn form_outcome<P: Serialize>(outcome: std::result::Result<P, FormErrors>) -> Result<String> {
    let value = match outcome {
        Ok(payload) => json!({ "ok": true, "payload": serde_json::to_value(payload)? }),
        Err(errors) => json!({ "ok": false, "errors": serde_json::to_value(errors)? }),
    };
    Ok(value.to_string())
}

fn validate_budget_impl(form_json: &str, today: &str) -> Result<String> {
    let form: BudgetForm = serde_json::from_str(form_json)?;
    form_outcome(form.validate(day(today)?))
}

/// Validate a budget form (JSON) into a result envelope (JSON).
#[wasm_bindgen(js_name = validateBudgetForm)]
pub fn validate_budget(form_json: &str, today: &str) -> JsResult<String> {
    Ok(validate_budget_impl(form_json, today)?)
}

fn validate_recurring_impl(form_json: &str, today: &str) -> Result<String> {
    let form: RecurringExpenseForm = serde_json::from_str(form_json)?;
    form_outcome(form.validate(day(today)?))
}

#[wasm_bindgen(js_name = validateRecurringForm)]
pub fn validate_recurring(form_json: &str, today: &str) -> JsResult<String> {
    Ok(validate_recurring_impl(form_json, today)?)
}

fn validate_expense_impl(form_json: &str, now: &str, timezone: &str) -> Result<String> {
    let form: ExpenseForm = serde_json::from_str(form_json)?;
    let now = parse_now(now)?;
    form_outcome(form.validate(now, &parse_timezone(timezone)?))
}

#[wasm_bindgen(js_name = validateExpenseForm)]
pub fn validate_expense(form_json: &str, now: &str, timezone: &str) -> JsResult<String> {
    Ok(validate_expense_impl(form_json, now, timezone)?)
}

// ── Wire dates ──────────────────────────────────────────────────────────────

fn parse_now(now: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(now)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EngineError::InvalidDatetime(format!("'{now}': {e}")).into())
}

fn expense_timestamp_impl(date: &str, now: &str, timezone: &str) -> Result<String> {
    let ts = expense_timestamp(day(date)?, parse_now(now)?, &parse_timezone(timezone)?)?;
    Ok(format_timestamp(ts))
}

/// The UTC timestamp sent for an expense on `date` entered at `now`.
#[wasm_bindgen(js_name = expenseTimestamp)]
pub fn timestamp(date: &str, now: &str, timezone: &str) -> JsResult<String> {
    Ok(expense_timestamp_impl(date, now, timezone)?)
}
