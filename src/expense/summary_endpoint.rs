//! The route handler for summary statistics over a user's expenses.

use axum::extract::State;

use crate::{
    Error,
    auth::CurrentUser,
    expense::{ExpenseFilter, ExpenseState, ExpenseSummary, query_expenses, summarize},
    extract::{Json, Query},
    timezone::local_today,
};

/// A route handler for the totals of the current user's expenses, overall and per category.
///
/// Takes the same query parameters as the expense list and summarises exactly the expenses the
/// list would return.
///
/// # Errors
///
/// Returns an [Error::InvalidQuery] if a query parameter cannot be parsed, or an
/// [Error::SqlError] if the expenses could not be fetched.
pub async fn expense_summary_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<ExpenseSummary>, Error> {
    let today = local_today(&state.local_timezone)
        .inspect_err(|error| tracing::error!("could not get today's date: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = query_expenses(user.id, &filter, today, &connection)
        .inspect_err(|error| tracing::error!("could not query expenses: {error}"))?;

    Ok(Json(summarize(&expenses)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::{Duration, OffsetDateTime};

    use crate::{
        endpoints,
        test_utils::{create_test_expense, get_test_server, sign_up_and_log_in},
    };

    fn days_ago(days: i64) -> String {
        (OffsetDateTime::now_utc().date() - Duration::days(days)).to_string()
    }

    #[tokio::test]
    async fn summary_of_week_matches_listed_expenses() {
        let server = get_test_server();
        let token = sign_up_and_log_in(&server, "alice").await;
        create_test_expense(&server, &token, "10.25", "groceries", &days_ago(1)).await;
        create_test_expense(&server, &token, "4.75", "groceries", &days_ago(2)).await;
        create_test_expense(&server, &token, "20", "leisure", &days_ago(3)).await;
        create_test_expense(&server, &token, "100", "leisure", &days_ago(30)).await;

        let response = server
            .get(endpoints::EXPENSE_SUMMARY)
            .authorization_bearer(&token)
            .add_query_param("period", "week")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({
                "total_amount": "35.00",
                "total_count": 3,
                "categories": [
                    { "category": "groceries", "total": "15.00", "count": 2 },
                    { "category": "leisure", "total": "20.00", "count": 1 },
                ],
            })
        );

        let listed = server
            .get(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .add_query_param("period", "week")
            .await
            .json::<Vec<Value>>();
        assert_eq!(listed.len(), 3);
    }

    #[tokio::test]
    async fn summary_of_inverted_range_is_zero() {
        let server = get_test_server();
        let token = sign_up_and_log_in(&server, "alice").await;
        create_test_expense(&server, &token, "10", "others", "2025-02-10").await;

        let response = server
            .get(endpoints::EXPENSE_SUMMARY)
            .authorization_bearer(&token)
            .add_query_param("start_date", "2025-03-01")
            .add_query_param("end_date", "2025-01-01")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "total_amount": "0.00", "total_count": 0, "categories": [] })
        );
    }

    #[tokio::test]
    async fn summary_ignores_other_users_expenses() {
        let server = get_test_server();
        let alice_token = sign_up_and_log_in(&server, "alice").await;
        let bob_token = sign_up_and_log_in(&server, "bob").await;
        create_test_expense(&server, &alice_token, "1", "others", "2025-02-10").await;
        create_test_expense(&server, &bob_token, "1000", "others", "2025-02-10").await;

        let summary = server
            .get(endpoints::EXPENSE_SUMMARY)
            .authorization_bearer(&alice_token)
            .await
            .json::<Value>();

        assert_eq!(summary["total_amount"], "1.00");
        assert_eq!(summary["total_count"], 1);
    }

    #[tokio::test]
    async fn summary_requires_token() {
        let server = get_test_server();

        server
            .get(endpoints::EXPENSE_SUMMARY)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
