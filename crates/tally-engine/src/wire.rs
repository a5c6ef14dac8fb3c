//! Request payloads and the date conventions of the backend contract.
//!
//! Budgets and recurring expenses carry calendar dates (`YYYY-MM-DD`).
//! Individual expenses carry a full ISO 8601 UTC timestamp: the calendar
//! date the user picked plus the current local time of day.

use chrono::{
    DateTime, LocalResult, NaiveDate, Offset, SecondsFormat, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};
use crate::period::{Period, Recurrence};

/// `strftime` pattern for day-granularity dates.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

// ── Date formatting ─────────────────────────────────────────────────────────

pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDatetime`] if the string is not a valid calendar date.
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
        .map_err(|e| EngineError::InvalidDatetime(format!("'{}': {}", s.trim(), e)))
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2024-03-15T14:03:27.120Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an IANA timezone name.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTimezone`] for unknown names.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{}'", s.trim())))
}

/// Build the timestamp sent for a new expense: `date` at `now`'s local time
/// of day in `tz`, converted to UTC.
///
/// DST transitions resolve the way a browser `Date` does: an ambiguous time
/// takes the earlier offset, and a time skipped by a forward transition moves
/// forward by the gap.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDatetime`] only when `date` is at the very
/// edge of the representable calendar.
pub fn expense_timestamp(date: NaiveDate, now: DateTime<Utc>, tz: &Tz) -> Result<DateTime<Utc>> {
    let time_of_day = now.with_timezone(tz).time();
    let naive = date.and_time(time_of_day);
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Some(local),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            // Forward gap: read the time with the offset in force before it,
            // so 02:30 on a 02:00 -> 03:00 jump lands on 03:30.
            let before = naive
                .checked_sub_signed(TimeDelta::days(1))
                .and_then(|earlier| tz.from_local_datetime(&earlier).earliest())
                .map(|earlier| earlier.offset().fix());
            before
                .and_then(|offset| offset.from_local_datetime(&naive).single())
                .map(|fixed| fixed.with_timezone(tz))
        }
    };
    local.map(|local| local.with_timezone(&Utc)).ok_or_else(|| {
        EngineError::InvalidDatetime(format!(
            "'{}' does not exist in {}",
            naive.format("%Y-%m-%dT%H:%M:%S"),
            tz.name()
        ))
    })
}

// ── serde helpers ───────────────────────────────────────────────────────────

pub(crate) fn ser_day<S: Serializer>(date: &NaiveDate, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format_day(*date))
}

pub(crate) fn ser_timestamp<S: Serializer>(
    ts: &DateTime<Utc>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(*ts))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (keeping its date part).
pub(crate) fn de_day<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    day_from_str(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn de_day_opt<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(d)? {
        Some(raw) => day_from_str(&raw).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn day_from_str(raw: &str) -> Result<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(ts.date_naive());
    }
    parse_day(raw)
}

// ── Payloads ────────────────────────────────────────────────────────────────

/// Body of budget create and update requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPayload {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_limit: Decimal,
    pub period: Period,
    #[serde(serialize_with = "ser_day")]
    pub start_date: NaiveDate,
    #[serde(serialize_with = "ser_day")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    #[serde(serialize_with = "ser_timestamp")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecurringExpense {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    pub recurrence: Recurrence,
    #[serde(serialize_with = "ser_day")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
