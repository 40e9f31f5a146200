//! The route handler for recording a new expense.

use axum::{extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::CurrentUser,
    expense::{Expense, ExpenseCategory, ExpenseState, NewExpense, create_expense},
    extract::Json,
};

/// The request body for creating an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpenseForm {
    /// How much was spent, as a JSON string or number.
    pub amount: Decimal,
    /// What kind of thing the money was spent on.
    pub category: ExpenseCategory,
    /// An optional note about the expense.
    #[serde(default)]
    pub description: Option<String>,
    /// When the money was spent.
    pub date: Date,
}

/// A route handler for creating a new expense owned by the current user.
///
/// Responds with `201 Created` and the new expense.
///
/// # Errors
///
/// Returns an [Error::Validation] if the amount or description is invalid, or an
/// [Error::SqlError] if the expense could not be saved.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<CreateExpenseForm>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let new_expense = NewExpense::new(form.amount, form.category, form.description, form.date)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = create_expense(user.id, new_expense, &connection)
        .inspect_err(|error| tracing::error!("could not create expense: {error}"))?;

    Ok((StatusCode::CREATED, Json(expense)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{get_test_server, sign_up_and_log_in},
    };

    #[tokio::test]
    async fn create_expense_succeeds() {
        let server = get_test_server();
        let token = sign_up_and_log_in(&server, "alice").await;

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .json(&json!({
                "amount": "12.5",
                "category": "groceries",
                "description": "Milk and bread",
                "date": "2025-03-14",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let expense = response.json::<Value>();
        assert!(expense["id"].as_i64().is_some());
        assert_eq!(expense["amount"], "12.50");
        assert_eq!(expense["category"], "groceries");
        assert_eq!(expense["description"], "Milk and bread");
        assert_eq!(expense["date"], "2025-03-14");
        assert!(expense["created_at"].is_string());
        assert!(expense["updated_at"].is_null());
    }

    #[tokio::test]
    async fn create_expense_accepts_numeric_amount_and_no_description() {
        let server = get_test_server();
        let token = sign_up_and_log_in(&server, "alice").await;

        let response = server
            .post(endpoints::EXPENSES_NO_SLASH)
            .authorization_bearer(&token)
            .json(&json!({
                "amount": 3,
                "category": "others",
                "date": "2025-03-14",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let expense = response.json::<Value>();
        assert_eq!(expense["amount"], "3.00");
        assert!(expense["description"].is_null());
    }

    #[tokio::test]
    async fn create_expense_rejects_invalid_fields() {
        let server = get_test_server();
        let token = sign_up_and_log_in(&server, "alice").await;
        let long_description = "a".repeat(501);
        let cases = [
            json!({ "amount": "0", "category": "others", "date": "2025-03-14" }),
            json!({ "amount": "-5", "category": "others", "date": "2025-03-14" }),
            json!({ "amount": "1.234", "category": "others", "date": "2025-03-14" }),
            json!({ "amount": "1", "category": "furniture", "date": "2025-03-14" }),
            json!({ "amount": "1", "category": "others", "date": "14/03/2025" }),
            json!({ "amount": "1", "category": "others" }),
            json!({
                "amount": "1",
                "category": "others",
                "date": "2025-03-14",
                "description": long_description,
            }),
        ];

        for body in cases {
            let response = server
                .post(endpoints::EXPENSES)
                .authorization_bearer(&token)
                .json(&body)
                .await;

            assert_eq!(
                response.status_code(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "want 422 for {body}, got {}",
                response.status_code()
            );
        }
    }

    #[tokio::test]
    async fn create_expense_requires_token() {
        let server = get_test_server();

        server
            .post(endpoints::EXPENSES)
            .json(&json!({ "amount": "1", "category": "others", "date": "2025-03-14" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
