//! Filtering and summarising a user's expenses.

use std::collections::BTreeMap;

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error, UserID,
    expense::{
        Amount, Expense, ExpenseCategory,
        core::{EXPENSE_COLUMNS, map_expense_row},
    },
};

/// A trailing window of days ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Period {
    /// The last 7 days.
    #[serde(rename = "week")]
    Week,
    /// The last 30 days.
    #[serde(rename = "month")]
    Month,
    /// The last 90 days.
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl Period {
    /// The number of days the period reaches back from today.
    pub fn days(self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::ThreeMonths => 90,
        }
    }
}

/// The optional filters that narrow down a list of expenses.
///
/// An explicit `start_date` or `end_date` takes precedence over `period`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpenseFilter {
    /// Only include expenses from a trailing period ending today.
    pub period: Option<Period>,
    /// Only include expenses on or after this date.
    pub start_date: Option<Date>,
    /// Only include expenses on or before this date.
    pub end_date: Option<Date>,
    /// Only include expenses in this category.
    pub category: Option<ExpenseCategory>,
}

impl ExpenseFilter {
    /// The inclusive lower and upper date bounds implied by the filter, given today's date.
    ///
    /// A `None` bound is unbounded.
    pub fn date_bounds(&self, today: Date) -> (Option<Date>, Option<Date>) {
        if self.start_date.is_some() || self.end_date.is_some() {
            return (self.start_date, self.end_date);
        }

        match self.period {
            Some(period) => {
                let start = today
                    .checked_sub(Duration::days(period.days()))
                    .unwrap_or(Date::MIN);

                (Some(start), Some(today))
            }
            None => (None, None),
        }
    }
}

/// Get the expenses belonging to `owner` that match `filter`, newest first.
///
/// Expenses on the same date are ordered by descending ID so the order is stable.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn query_expenses(
    owner: UserID,
    filter: &ExpenseFilter,
    today: Date,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(owner.as_i64())];

    let (start_date, end_date) = filter.date_bounds(today);

    if let Some(start_date) = start_date {
        query_parameters.push(Value::Text(start_date.to_string()));
        where_clause_parts.push(format!("date >= ?{}", query_parameters.len()));
    }

    if let Some(end_date) = end_date {
        query_parameters.push(Value::Text(end_date.to_string()));
        where_clause_parts.push(format!("date <= ?{}", query_parameters.len()));
    }

    if let Some(category) = filter.category {
        query_parameters.push(Value::Text(category.as_str().to_owned()));
        where_clause_parts.push(format!("category = ?{}", query_parameters.len()));
    }

    let query_string = format!(
        "SELECT {EXPENSE_COLUMNS} FROM expense WHERE {} ORDER BY date DESC, id DESC",
        where_clause_parts.join(" AND ")
    );

    connection
        .prepare(&query_string)?
        .query_map(params_from_iter(query_parameters.iter()), map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::SqlError))
        .collect()
}

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    /// The category the totals are for.
    pub category: ExpenseCategory,
    /// The sum of the amounts in this category.
    pub total: Amount,
    /// The number of expenses in this category.
    pub count: usize,
}

/// Totals over a set of expenses, overall and per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSummary {
    /// The sum of all amounts.
    pub total_amount: Amount,
    /// The number of expenses.
    pub total_count: usize,
    /// Per category totals for the categories that have at least one expense.
    pub categories: Vec<CategorySummary>,
}

/// Summarise `expenses` overall and per category.
///
/// Categories are listed in [ExpenseCategory] order.
pub fn summarize(expenses: &[Expense]) -> ExpenseSummary {
    let mut by_category: BTreeMap<ExpenseCategory, (Amount, usize)> = BTreeMap::new();

    for expense in expenses {
        let (total, count) = by_category
            .entry(expense.category)
            .or_insert((Amount::zero(), 0));
        *total = *total + expense.amount;
        *count += 1;
    }

    ExpenseSummary {
        total_amount: expenses.iter().map(|expense| expense.amount).sum(),
        total_count: expenses.len(),
        categories: by_category
            .into_iter()
            .map(|(category, (total, count))| CategorySummary {
                category,
                total,
                count,
            })
            .collect(),
    }
}
