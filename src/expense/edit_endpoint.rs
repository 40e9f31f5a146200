//! The route handler for partially updating an expense.

use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

use crate::{
    Error,
    auth::CurrentUser,
    database_id::ExpenseId,
    expense::{
        Amount, Expense, ExpenseCategory, ExpenseState, ExpenseUpdate, update_expense,
        validate_description,
    },
    extract::{Json, Path},
};

/// The request body for updating an expense.
///
/// Fields that are left out are not changed. Setting `description` to `null` removes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditExpenseForm {
    /// The new amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// The new category.
    #[serde(default)]
    pub category: Option<ExpenseCategory>,
    /// The new description, `Some(None)` if it was explicitly set to `null`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    /// The new date.
    #[serde(default)]
    pub date: Option<Date>,
}

/// Distinguishes a field set to `null` from a missing field.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl EditExpenseForm {
    fn into_update(self) -> Result<ExpenseUpdate, Error> {
        Ok(ExpenseUpdate {
            amount: self.amount.map(Amount::new).transpose()?,
            category: self.category,
            description: self.description.map(validate_description).transpose()?,
            date: self.date,
        })
    }
}

/// A route handler for updating one of the current user's expenses.
///
/// # Errors
///
/// Returns an [Error::Validation] if a new value is invalid, or an [Error::NotFound] if the
/// expense does not exist or belongs to another user.
pub async fn edit_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    Path(expense_id): Path<ExpenseId>,
    Json(form): Json<EditExpenseForm>,
) -> Result<Json<Expense>, Error> {
    let update = form.into_update()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_expense(expense_id, user.id, update, &connection).map(Json)
}
