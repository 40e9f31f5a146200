//! Expense management for the expense tracker.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model, its `Amount` and `ExpenseCategory`
//! - Database functions for storing, updating and deleting expenses
//! - Filtering by period, date range and category, and per category summaries
//! - The route handlers for the expense endpoints

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod list_endpoint;
mod query;
mod summary_endpoint;

pub use core::{
    Amount, Expense, ExpenseCategory, ExpenseState, ExpenseUpdate, MAX_DESCRIPTION_LENGTH,
    NewExpense, create_expense, create_expense_table, delete_expense, get_expense,
    update_expense, validate_description,
};
pub use create_endpoint::{CreateExpenseForm, create_expense_endpoint};
pub use delete_endpoint::delete_expense_endpoint;
pub use edit_endpoint::{EditExpenseForm, edit_expense_endpoint};
pub use get_endpoint::get_expense_endpoint;
pub use list_endpoint::list_expenses_endpoint;
pub use query::{
    CategorySummary, ExpenseFilter, ExpenseSummary, Period, query_expenses, summarize,
};
pub use summary_endpoint::expense_summary_endpoint;
