//! Client-side sorting and pagination for data tables.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::{Budget, Expense, RecurringExpense};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A row type that can be ordered by one of its columns.
pub trait Sortable {
    type Column: Copy;

    fn compare(&self, other: &Self, column: Self::Column) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort<C> {
    pub column: C,
    #[serde(default)]
    pub order: SortOrder,
}

/// Which slice of the table to show. `page` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery<C> {
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<Sort<C>>,
}

impl<C> Default for TableQuery<C> {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0 && self.total_pages > 0
    }
}

/// Sort (stably) then cut out the requested page.
///
/// A page past the end comes back empty with correct totals.
///
/// # Errors
///
/// Returns [`EngineError::InvalidArgument`] when `page_size` is zero.
pub fn paginate<T>(rows: &[T], query: &TableQuery<T::Column>) -> Result<Page<T>>
where
    T: Sortable + Clone,
{
    if query.page_size == 0 {
        return Err(EngineError::InvalidArgument(
            "page size must be at least 1".to_string(),
        ));
    }

    let mut sorted: Vec<T> = rows.to_vec();
    if let Some(sort) = query.sort {
        sorted.sort_by(|a, b| {
            let ord = a.compare(b, sort.column);
            match sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    let total_items = sorted.len();
    let total_pages = total_items.div_ceil(query.page_size);
    let items = sorted
        .into_iter()
        .skip(query.page.saturating_mul(query.page_size))
        .take(query.page_size)
        .collect();

    Ok(Page {
        items,
        page: query.page,
        page_size: query.page_size,
        total_items,
        total_pages,
    })
}

// ── Column definitions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseColumn {
    Date,
    Amount,
    Category,
    Description,
}

impl Sortable for Expense {
    type Column = ExpenseColumn;

    fn compare(&self, other: &Self, column: ExpenseColumn) -> Ordering {
        match column {
            ExpenseColumn::Date => self.date.cmp(&other.date),
            ExpenseColumn::Amount => self.amount.cmp(&other.amount),
            ExpenseColumn::Category => self.category.cmp(&other.category),
            ExpenseColumn::Description => self.description.cmp(&other.description),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BudgetColumn {
    Category,
    AmountLimit,
    AmountSpent,
    StartDate,
}

impl Sortable for Budget {
    type Column = BudgetColumn;

    fn compare(&self, other: &Self, column: BudgetColumn) -> Ordering {
        match column {
            BudgetColumn::Category => self.category.cmp(&other.category),
            BudgetColumn::AmountLimit => self.amount_limit.cmp(&other.amount_limit),
            BudgetColumn::AmountSpent => self.amount_spent.cmp(&other.amount_spent),
            BudgetColumn::StartDate => self.start_date.cmp(&other.start_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecurringColumn {
    Category,
    Amount,
    Date,
    NextOccurrence,
}

impl Sortable for RecurringExpense {
    type Column = RecurringColumn;

    fn compare(&self, other: &Self, column: RecurringColumn) -> Ordering {
        match column {
            RecurringColumn::Category => self.category.cmp(&other.category),
            RecurringColumn::Amount => self.amount.cmp(&other.amount),
            RecurringColumn::Date => self.date.cmp(&other.date),
            // Missing values sort first
            RecurringColumn::NextOccurrence => self.next_occurrence.cmp(&other.next_occurrence),
        }
    }
}
