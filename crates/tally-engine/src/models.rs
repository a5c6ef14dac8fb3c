//! Backend entities as the client reads them.
//!
//! The backend owns these records and all their math; the client only
//! displays them. Dates arrive either as `YYYY-MM-DD` or as full timestamps,
//! and both are accepted for day-granularity fields.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::period::{DateRange, Period, Recurrence};
use crate::wire::{de_day, de_day_opt, ser_day};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub amount_limit: Decimal,
    #[serde(default)]
    pub amount_spent: Decimal,
    pub period: Period,
    #[serde(deserialize_with = "de_day", serialize_with = "ser_day")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "de_day", serialize_with = "ser_day")]
    pub end_date: NaiveDate,
}

impl Budget {
    /// Limit minus spent; negative once the budget is exceeded.
    pub fn remaining(&self) -> Decimal {
        self.amount_limit - self.amount_spent
    }

    pub fn is_over_limit(&self) -> bool {
        self.amount_spent > self.amount_limit
    }

    /// # Errors
    ///
    /// Fails if the backend sent an inverted range.
    pub fn range(&self) -> Result<DateRange> {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub category: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringExpense {
    pub id: String,
    pub category: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub recurrence: Recurrence,
    #[serde(deserialize_with = "de_day", serialize_with = "ser_day")]
    pub date: NaiveDate,
    /// Supplied by the backend.
    #[serde(default, deserialize_with = "de_day_opt")]
    pub next_occurrence: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}
