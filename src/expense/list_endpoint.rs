//! The route handler for listing expenses.

use axum::extract::State;

use crate::{
    Error,
    auth::CurrentUser,
    expense::{Expense, ExpenseFilter, ExpenseState, query_expenses},
    extract::{Json, Query},
    timezone::local_today,
};

/// A route handler for listing the current user's expenses, newest first.
///
/// Accepts the optional query parameters `period` (`week`, `month` or `3months`), `start_date`,
/// `end_date` and `category`.
///
/// # Errors
///
/// Returns an [Error::InvalidQuery] if a query parameter cannot be parsed, or an
/// [Error::SqlError] if the expenses could not be fetched.
pub async fn list_expenses_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, Error> {
    let today = local_today(&state.local_timezone)
        .inspect_err(|error| tracing::error!("could not get today's date: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    query_expenses(user.id, &filter, today, &connection)
        .inspect_err(|error| tracing::error!("could not query expenses: {error}"))
        .map(Json)
}
