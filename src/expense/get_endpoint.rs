//! The route handler for fetching a single expense.

use axum::extract::State;

use crate::{
    Error,
    auth::CurrentUser,
    database_id::ExpenseId,
    expense::{Expense, ExpenseState, get_expense},
    extract::{Json, Path},
};

/// A route handler for getting one of the current user's expenses.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the expense does not exist or belongs to another user.
pub async fn get_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_expense(expense_id, user.id, &connection).map(Json)
}
