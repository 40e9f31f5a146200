use axum::{extract::State, http::StatusCode};

use crate::{
    Error,
    auth::CurrentUser,
    database_id::ExpenseId,
    expense::{ExpenseState, delete_expense},
    extract::Path,
};

/// A route handler for deleting one of the current user's expenses, responds with
/// `204 No Content`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the expense does not exist or belongs to another user.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    Path(expense_id): Path<ExpenseId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_expense(expense_id, user.id, &connection)?;
    tracing::info!("User {} deleted expense {expense_id}", user.id);

    Ok(StatusCode::NO_CONTENT)
}
