//! Budget period and recurrence date resolution.
//!
//! Maps a symbolic [`Period`] selector and a reference "today" to the
//! concrete, inclusive [`DateRange`] a budget form pre-fills, and a
//! [`Recurrence`] selector plus a start date to the next occurrence.
//!
//! All functions are pure: the caller provides "today" (no system clock
//! access), so results are reproducible and the same code runs natively and
//! in the browser via `tally-wasm`.
//!
//! # Functions
//!
//! - [`resolve_range`] — Default date range for a budget period (weeks start on Sunday)
//! - [`resolve_range_with_options`] — Same, with a configurable week start
//! - [`prefill_range`] — Form helper: resolve, or keep the user's dates for `CUSTOM`
//! - [`next_occurrence`] — Next firing date of a recurring expense

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

// ── Period / Recurrence ─────────────────────────────────────────────────────

/// The window over which a budget's spending limit applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    Weekly,
    Monthly,
    Yearly,
    /// User-supplied start and end dates; never computed by the resolver.
    Custom,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Weekly,
        Period::Monthly,
        Period::Yearly,
        Period::Custom,
    ];

    /// Wire name, as the backend expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Weekly => "WEEKLY",
            Period::Monthly => "MONTHLY",
            Period::Yearly => "YEARLY",
            Period::Custom => "CUSTOM",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Period::Custom)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(Period::Weekly),
            "MONTHLY" => Ok(Period::Monthly),
            "YEARLY" => Ok(Period::Yearly),
            "CUSTOM" => Ok(Period::Custom),
            _ => Err(EngineError::InvalidArgument(format!(
                "unknown period '{}'",
                s.trim()
            ))),
        }
    }
}

/// How often a recurring expense re-fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub const ALL: [Recurrence; 4] = [
        Recurrence::Daily,
        Recurrence::Weekly,
        Recurrence::Monthly,
        Recurrence::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Daily => "DAILY",
            Recurrence::Weekly => "WEEKLY",
            Recurrence::Monthly => "MONTHLY",
            Recurrence::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Recurrence::Daily),
            "WEEKLY" => Ok(Recurrence::Weekly),
            "MONTHLY" => Ok(Recurrence::Monthly),
            "YEARLY" => Ok(Recurrence::Yearly),
            _ => Err(EngineError::InvalidArgument(format!(
                "unknown recurrence '{}'",
                s.trim()
            ))),
        }
    }
}

// ── DateRange ───────────────────────────────────────────────────────────────

/// An inclusive `[start, end]` pair of calendar dates, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = EngineError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRange`] if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EngineError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.end)
    }
}

// ── Configurable week start ─────────────────────────────────────────────────

/// Which day begins a week for `WEEKLY` budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// US convention, used by the budget forms.
    #[default]
    Sunday,
    /// ISO 8601.
    Monday,
}

/// Options for [`resolve_range_with_options`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub week_start: WeekStartDay,
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> u64 {
    match week_start {
        WeekStartDay::Sunday => u64::from(weekday.num_days_from_sunday()),
        WeekStartDay::Monday => u64::from(weekday.num_days_from_monday()),
    }
}

// ── resolve_range ───────────────────────────────────────────────────────────

/// Resolve the default date range for a budget period, weeks starting on Sunday.
///
/// Returns `None` for [`Period::Custom`]: custom ranges are supplied by the
/// user and the resolver leaves them alone.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use tally_engine::period::{resolve_range, Period};
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(); // Friday
/// let range = resolve_range(Period::Weekly, today).unwrap();
/// assert_eq!(range.start(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
/// assert_eq!(range.end(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
/// ```
pub fn resolve_range(period: Period, today: NaiveDate) -> Option<DateRange> {
    resolve_range_with_options(period, today, &ResolveOptions::default())
}

/// Resolve the default date range for a budget period with options.
///
/// | Period  | start                              | end                          |
/// |---------|------------------------------------|------------------------------|
/// | Weekly  | week-start day on/before `today`   | `start + 6 days`             |
/// | Monthly | 1st of `today`'s month             | last day of `today`'s month  |
/// | Yearly  | January 1 of `today`'s year        | December 31 of `today`'s year|
/// | Custom  | not computed (`None`)              | not computed                 |
///
/// Bounds are clamped to chrono's representable calendar at its extreme edges.
pub fn resolve_range_with_options(
    period: Period,
    today: NaiveDate,
    options: &ResolveOptions,
) -> Option<DateRange> {
    let (start, end) = match period {
        Period::Weekly => {
            let back = days_from_week_start(today.weekday(), options.week_start);
            let start = today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
            let end = start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
            (start, end)
        }
        Period::Monthly => (first_of_month(today), last_of_month(today)),
        Period::Yearly => {
            let start = today - Days::new(u64::from(today.ordinal0()));
            let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(NaiveDate::MAX);
            (start, end)
        }
        Period::Custom => return None,
    };
    Some(DateRange { start, end })
}

/// The range a budget form should show after the period selection changes.
///
/// Non-custom periods always get the resolved default. For `CUSTOM` the
/// caller's `current` dates are returned untouched.
pub fn prefill_range(
    period: Period,
    today: NaiveDate,
    current: Option<DateRange>,
) -> Option<DateRange> {
    resolve_range(period, today).or(current)
}

// ── next_occurrence ─────────────────────────────────────────────────────────

/// The first occurrence strictly after `from` for a recurrence.
///
/// Monthly and yearly steps land on the last day of the target month when
/// `from`'s day does not exist there (Jan 31 → Feb 29 in 2024). Returns
/// `None` only past the end of the representable calendar.
///
/// The backend's `next_occurrence` is authoritative; this is for previews.
pub fn next_occurrence(recurrence: Recurrence, from: NaiveDate) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::Daily => from.succ_opt(),
        Recurrence::Weekly => from.checked_add_days(Days::new(7)),
        Recurrence::Monthly => from.checked_add_months(Months::new(1)),
        Recurrence::Yearly => from.checked_add_months(Months::new(12)),
    }
}

// ── Internal helpers ────────────────────────────────────────────────────────

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Day before the 1st of the following month.
fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // ── weekly ──────────────────────────────────────────────────────────

    #[test]
    fn test_weekly_mid_week() {
        // 2024-03-15 is a Friday
        let range = resolve_range(Period::Weekly, d(2024, 3, 15)).unwrap();
        assert_eq!(range.start(), d(2024, 3, 10));
        assert_eq!(range.end(), d(2024, 3, 16));
        assert_eq!(range.start().weekday(), Weekday::Sun);
        assert_eq!(range.end().weekday(), Weekday::Sat);
    }

    #[test]
    fn test_weekly_crosses_year_boundary() {
        // 2024-01-02 is a Tuesday; its week began on Sunday 2023-12-31
        let range = resolve_range(Period::Weekly, d(2024, 1, 2)).unwrap();
        assert_eq!(range.start(), d(2023, 12, 31));
        assert_eq!(range.end(), d(2024, 1, 6));
    }

    #[test]
    fn test_weekly_on_sunday_starts_same_day() {
        let range = resolve_range(Period::Weekly, d(2024, 3, 10)).unwrap();
        assert_eq!(range.start(), d(2024, 3, 10));
        assert_eq!(range.end(), d(2024, 3, 16));
    }

    #[test]
    fn test_weekly_on_saturday_ends_same_day() {
        let range = resolve_range(Period::Weekly, d(2024, 3, 16)).unwrap();
        assert_eq!(range.start(), d(2024, 3, 10));
        assert_eq!(range.end(), d(2024, 3, 16));
    }

    #[test]
    fn test_weekly_monday_start_option() {
        let options = ResolveOptions {
            week_start: WeekStartDay::Monday,
        };
        let range = resolve_range_with_options(Period::Weekly, d(2024, 3, 15), &options).unwrap();
        assert_eq!(range.start(), d(2024, 3, 11));
        assert_eq!(range.end(), d(2024, 3, 17));
    }

    // ── monthly ─────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_leap_february() {
        let range = resolve_range(Period::Monthly, d(2024, 2, 20)).unwrap();
        assert_eq!(range.start(), d(2024, 2, 1));
        assert_eq!(range.end(), d(2024, 2, 29));
    }

    #[test]
    fn test_monthly_non_leap_february() {
        let range = resolve_range(Period::Monthly, d(2023, 2, 20)).unwrap();
        assert_eq!(range.start(), d(2023, 2, 1));
        assert_eq!(range.end(), d(2023, 2, 28));
    }

    #[test]
    fn test_monthly_thirty_and_thirty_one_days() {
        assert_eq!(
            resolve_range(Period::Monthly, d(2024, 4, 1)).unwrap().end(),
            d(2024, 4, 30)
        );
        assert_eq!(
            resolve_range(Period::Monthly, d(2024, 12, 31)).unwrap().end(),
            d(2024, 12, 31)
        );
    }

    #[test]
    fn test_monthly_century_non_leap() {
        // 1900 is divisible by 100 but not 400
        let range = resolve_range(Period::Monthly, d(1900, 2, 14)).unwrap();
        assert_eq!(range.end(), d(1900, 2, 28));
    }

    // ── yearly / custom ─────────────────────────────────────────────────

    #[test]
    fn test_yearly() {
        let range = resolve_range(Period::Yearly, d(2024, 7, 4)).unwrap();
        assert_eq!(range.start(), d(2024, 1, 1));
        assert_eq!(range.end(), d(2024, 12, 31));
        assert_eq!(range.num_days(), 366);
    }

    #[test]
    fn test_custom_is_not_resolved() {
        assert!(resolve_range(Period::Custom, d(2024, 7, 4)).is_none());
    }

    #[test]
    fn test_prefill_keeps_custom_dates() {
        let mine = DateRange::new(d(2024, 5, 3), d(2024, 6, 9)).unwrap();
        assert_eq!(
            prefill_range(Period::Custom, d(2024, 7, 4), Some(mine)),
            Some(mine)
        );
        assert_eq!(prefill_range(Period::Custom, d(2024, 7, 4), None), None);
    }

    #[test]
    fn test_prefill_overrides_for_fixed_periods() {
        let mine = DateRange::new(d(2024, 5, 3), d(2024, 6, 9)).unwrap();
        let range = prefill_range(Period::Monthly, d(2024, 7, 4), Some(mine)).unwrap();
        assert_eq!(range.start(), d(2024, 7, 1));
        assert_eq!(range.end(), d(2024, 7, 31));
    }

    // ── DateRange ───────────────────────────────────────────────────────

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let err = DateRange::new(d(2024, 2, 2), d(2024, 2, 1)).unwrap_err();
        assert!(err.to_string().contains("is after end"), "got: {err}");
    }

    #[test]
    fn test_range_single_day() {
        let range = DateRange::new(d(2024, 2, 2), d(2024, 2, 2)).unwrap();
        assert_eq!(range.num_days(), 1);
        assert!(range.contains(d(2024, 2, 2)));
        assert!(!range.contains(d(2024, 2, 3)));
    }

    #[test]
    fn test_range_deserialize_validates() {
        let ok: DateRange =
            serde_json::from_str(r#"{"start":"2024-01-01","end":"2024-01-31"}"#).unwrap();
        assert_eq!(ok.end(), d(2024, 1, 31));

        let bad = serde_json::from_str::<DateRange>(r#"{"start":"2024-02-01","end":"2024-01-31"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_range_display() {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert_eq!(range.to_string(), "2024-01-01/2024-01-31");
    }

    // ── enums ───────────────────────────────────────────────────────────

    #[test]
    fn test_period_parse_is_case_insensitive() {
        assert_eq!("weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert_eq!(" Custom ".parse::<Period>().unwrap(), Period::Custom);
    }

    #[test]
    fn test_period_parse_unknown_is_invalid_argument() {
        let err = "fortnightly".parse::<Period>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn test_enums_use_upper_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&Period::Monthly).unwrap(), "\"MONTHLY\"");
        assert_eq!(
            serde_json::from_str::<Recurrence>("\"DAILY\"").unwrap(),
            Recurrence::Daily
        );
    }

    // ── next_occurrence ─────────────────────────────────────────────────

    #[test]
    fn test_next_occurrence_steps() {
        let start = d(2024, 1, 31);
        assert_eq!(next_occurrence(Recurrence::Daily, start), Some(d(2024, 2, 1)));
        assert_eq!(next_occurrence(Recurrence::Weekly, start), Some(d(2024, 2, 7)));
        // Clamped to the end of February
        assert_eq!(next_occurrence(Recurrence::Monthly, start), Some(d(2024, 2, 29)));
        assert_eq!(next_occurrence(Recurrence::Yearly, start), Some(d(2025, 1, 31)));
    }

    #[test]
    fn test_next_occurrence_yearly_from_leap_day() {
        assert_eq!(
            next_occurrence(Recurrence::Yearly, d(2024, 2, 29)),
            Some(d(2025, 2, 28))
        );
    }

    // ── properties ──────────────────────────────────────────────────────

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        // 1800-01-01 .. roughly 2210
        (0u64..150_000).prop_map(|n| d(1800, 1, 1) + Days::new(n))
    }

    proptest! {
        #[test]
        fn prop_weekly_is_sunday_to_saturday(today in any_date()) {
            let range = resolve_range(Period::Weekly, today).unwrap();
            prop_assert_eq!(range.start().weekday(), Weekday::Sun);
            prop_assert_eq!(range.end().weekday(), Weekday::Sat);
            prop_assert_eq!(range.num_days(), 7);
            prop_assert!(range.contains(today));
        }

        #[test]
        fn prop_monthly_covers_whole_month(today in any_date()) {
            let range = resolve_range(Period::Monthly, today).unwrap();
            prop_assert_eq!(range.start().day(), 1);
            prop_assert_eq!(range.start().month(), today.month());
            prop_assert_eq!(range.end().month(), today.month());
            prop_assert_eq!(range.end().succ_opt().unwrap().day(), 1);
            prop_assert!(range.contains(today));
        }

        #[test]
        fn prop_yearly_is_calendar_year(today in any_date()) {
            let range = resolve_range(Period::Yearly, today).unwrap();
            prop_assert_eq!(range.start(), d(today.year(), 1, 1));
            prop_assert_eq!(range.end(), d(today.year(), 12, 31));
        }

        #[test]
        fn prop_resolution_is_idempotent(today in any_date()) {
            for period in Period::ALL {
                let before = today;
                prop_assert_eq!(resolve_range(period, today), resolve_range(period, today));
                prop_assert_eq!(today, before);
            }
        }

        #[test]
        fn prop_next_occurrence_is_strictly_later(from in any_date()) {
            for recurrence in Recurrence::ALL {
                prop_assert!(next_occurrence(recurrence, from).unwrap() > from);
            }
        }
    }
}
