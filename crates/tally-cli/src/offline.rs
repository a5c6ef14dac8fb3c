//! Commands that need neither the backend nor a session.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tally_engine::{
    format_day, next_occurrence, resolve_range_with_options, validate_start, DateRange, Period,
    Recurrence, ResolveOptions, WeekStartDay,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeOutput {
    period: Period,
    start_date: String,
    end_date: String,
    days: i64,
}

/// Pre-fill from the period, then apply explicit dates on top, the same way
/// `budgets add` builds its form.
pub fn period(
    period: Period,
    today: NaiveDate,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    week_start: WeekStartDay,
) -> Result<()> {
    let resolved = resolve_range_with_options(period, today, &ResolveOptions { week_start });
    let start = start.or(resolved.map(|r| r.start()));
    let end = end.or(resolved.map(|r| r.end()));
    let (Some(start), Some(end)) = (start, end) else {
        bail!("a CUSTOM period needs --start and --end");
    };
    let range = DateRange::new(start, end)?;

    let output = RangeOutput {
        period,
        start_date: format_day(range.start()),
        end_date: format_day(range.end()),
        days: range.num_days(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn check_start(date: NaiveDate, today: NaiveDate) -> Result<()> {
    validate_start(date, today)?;
    println!("ok");
    Ok(())
}

pub fn next(recurrence: Recurrence, from: NaiveDate, count: u32) -> Result<()> {
    let mut current = from;
    for _ in 0..count {
        current = next_occurrence(recurrence, current)
            .with_context(|| format!("no {recurrence} occurrence after {current}"))?;
        println!("{}", format_day(current));
    }
    Ok(())
}
