//! Defines the core data models and database queries for expenses.

use std::{
    fmt::Display,
    iter::Sum,
    ops::Add,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{AppState, Error, UserID, database_id::ExpenseId};

// ============================================================================
// MODELS
// ============================================================================

/// The fixed set of categories an expense can be filed under.
///
/// The variant order is the order categories are listed in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    /// Food and household supplies.
    Groceries,
    /// Entertainment, eating out, hobbies.
    Leisure,
    /// Devices and gadgets.
    Electronics,
    /// Power, water, internet and similar bills.
    Utilities,
    /// Clothes and shoes.
    Clothing,
    /// Medical and wellbeing costs.
    Health,
    /// Anything that does not fit another category.
    Others,
}

impl ExpenseCategory {
    /// All categories in summary order.
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::Groceries,
        ExpenseCategory::Leisure,
        ExpenseCategory::Electronics,
        ExpenseCategory::Utilities,
        ExpenseCategory::Clothing,
        ExpenseCategory::Health,
        ExpenseCategory::Others,
    ];

    /// The lowercase name used in JSON, query strings and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Groceries => "groceries",
            Self::Leisure => "leisure",
            Self::Electronics => "electronics",
            Self::Utilities => "utilities",
            Self::Clothing => "clothing",
            Self::Health => "health",
            Self::Others => "others",
        }
    }
}

impl Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown expense category {s:?}"))
    }
}

impl ToSql for ExpenseCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ExpenseCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A positive amount of money with at most two decimal places.
///
/// Amounts are always stored with exactly two decimal places, so `12.5` becomes `12.50`.
/// In JSON an amount is written as a string to avoid losing precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The number of decimal places amounts are stored with.
    pub const SCALE: u32 = 2;

    /// Amounts must be strictly less than this value, i.e. at most eight integer digits.
    const UPPER_BOUND: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    /// Create and validate an expense amount.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `value` is not greater than zero, has more than two
    /// significant decimal places, or has more than eight integer digits.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let invalid = |message: &str| Error::Validation {
            field: "amount",
            message: message.to_owned(),
        };

        if value <= Decimal::ZERO {
            return Err(invalid("must be greater than zero"));
        }

        if value.normalize().scale() > Self::SCALE {
            return Err(invalid("must have at most 2 decimal places"));
        }

        if value >= Self::UPPER_BOUND {
            return Err(invalid("must be less than 100000000"));
        }

        let mut value = value;
        value.rescale(Self::SCALE);

        Ok(Self(value))
    }

    /// The zero amount, used for empty summaries.
    pub fn zero() -> Self {
        Self(Decimal::new(0, Self::SCALE))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::zero(), Add::add)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Decimal::from_str(value.as_str()?)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An amount of money the user spent on something.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user that recorded the expense.
    pub user_id: UserID,
    /// How much was spent.
    pub amount: Amount,
    /// What kind of thing the money was spent on.
    pub category: ExpenseCategory,
    /// An optional note about the expense.
    pub description: Option<String>,
    /// When the money was spent.
    pub date: Date,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the expense was last changed, if ever.
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// The maximum number of characters in an expense description.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Check that an optional description is no longer than [MAX_DESCRIPTION_LENGTH] characters.
///
/// # Errors
///
/// Returns an [Error::Validation] if the description is too long.
pub fn validate_description(description: Option<String>) -> Result<Option<String>, Error> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => Err(Error::Validation {
            field: "description",
            message: format!("must be at most {MAX_DESCRIPTION_LENGTH} characters long"),
        }),
        description => Ok(description),
    }
}

/// The validated data needed to record a new expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// How much was spent.
    pub amount: Amount,
    /// What kind of thing the money was spent on.
    pub category: ExpenseCategory,
    /// An optional note about the expense.
    pub description: Option<String>,
    /// When the money was spent.
    pub date: Date,
}

impl NewExpense {
    /// Validate the fields of a new expense.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if the amount or description is invalid.
    pub fn new(
        amount: Decimal,
        category: ExpenseCategory,
        description: Option<String>,
        date: Date,
    ) -> Result<Self, Error> {
        Ok(Self {
            amount: Amount::new(amount)?,
            category,
            description: validate_description(description)?,
            date,
        })
    }
}

/// A partial update to an expense. `None` fields are left unchanged.
///
/// `description` is doubly optional: `Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    /// The new amount.
    pub amount: Option<Amount>,
    /// The new category.
    pub category: Option<ExpenseCategory>,
    /// The new description, or `Some(None)` to remove it.
    pub description: Option<Option<String>>,
    /// The new date.
    pub date: Option<Date>,
}

// ============================================================================
// STATE
// ============================================================================

/// The state needed by the expense endpoints.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub(crate) const EXPENSE_COLUMNS: &str =
    "id, user_id, amount, category, description, date, created_at, updated_at";

/// Create the expense table.
///
/// Expenses are deleted along with their owner.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date)",
        (),
    )?;

    Ok(())
}

/// Record a new expense for `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `owner` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    owner: UserID,
    expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO expense (user_id, amount, category, description, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                owner.as_i64(),
                expense.amount,
                expense.category,
                expense.description,
                expense.date,
                OffsetDateTime::now_utc(),
            ),
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Retrieve the expense `id` if it belongs to `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `owner`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(id: ExpenseId, owner: UserID, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, owner.as_i64()), map_expense_row)
        .map_err(Error::from)
}

/// Apply `update` to the expense `id` if it belongs to `owner`, returning the updated expense.
///
/// Fields that are `None` in `update` keep their current value. The `updated_at` timestamp is
/// always set.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `owner`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    owner: UserID,
    update: ExpenseUpdate,
    connection: &Connection,
) -> Result<Expense, Error> {
    let replace_description = update.description.is_some();
    let description = update.description.flatten();

    connection
        .prepare(&format!(
            "UPDATE expense
            SET \
                amount = COALESCE(?1, amount), \
                category = COALESCE(?2, category), \
                description = CASE WHEN ?3 THEN ?4 ELSE description END, \
                date = COALESCE(?5, date), \
                updated_at = ?6 \
            WHERE id = ?7 AND user_id = ?8
            RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                update.amount,
                update.category,
                replace_description,
                description,
                update.date,
                OffsetDateTime::now_utc(),
                id,
                owner.as_i64(),
            ],
            map_expense_row,
        )
        .map_err(Error::from)
}

/// Delete the expense `id` if it belongs to `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `owner`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(id: ExpenseId, owner: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (id, owner.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

pub(crate) fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        date: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}



#[cfg(test)]
mod database_tests {
    use std::str::FromStr;

    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Email, Error, PasswordHash, User, Username, create_user,
        expense::{
            ExpenseCategory, ExpenseUpdate, NewExpense, create_expense, delete_expense,
            get_expense, update_expense,
        },
        initialize_db,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        connection
    }

    fn create_test_user(name: &str, connection: &Connection) -> User {
        create_user(
            Username::new_unchecked(name),
            Email::new_unchecked(&format!("{name}@example.com")),
            PasswordHash::new_unchecked("hunter2"),
            connection,
        )
        .unwrap()
    }

    fn new_expense(amount: &str, category: ExpenseCategory) -> NewExpense {
        NewExpense::new(
            Decimal::from_str(amount).unwrap(),
            category,
            Some("Weekly shop".to_owned()),
            date!(2025 - 03 - 14),
        )
        .unwrap()
    }

    #[test]
    fn create_then_get_returns_identical_expense() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);

        let created = create_expense(
            user.id,
            new_expense("54.20", ExpenseCategory::Groceries),
            &connection,
        )
        .unwrap();
        let retrieved = get_expense(created.id, user.id, &connection).unwrap();

        assert_eq!(created, retrieved);
        assert_eq!(created.amount.to_string(), "54.20");
        assert_eq!(created.category, ExpenseCategory::Groceries);
        assert_eq!(created.description.as_deref(), Some("Weekly shop"));
        assert_eq!(created.date, date!(2025 - 03 - 14));
        assert_eq!(created.updated_at, None);
    }

    #[test]
    fn create_fails_for_unknown_user() {
        let connection = get_test_connection();

        let result = create_expense(
            crate::UserID::new(999),
            new_expense("1.00", ExpenseCategory::Others),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_fails_for_other_users_expense() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let expense = create_expense(
            alice.id,
            new_expense("10.00", ExpenseCategory::Leisure),
            &connection,
        )
        .unwrap();

        assert_eq!(
            get_expense(expense.id, bob.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            get_expense(expense.id + 1, alice.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_changes_only_given_fields() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let expense = create_expense(
            user.id,
            new_expense("10.00", ExpenseCategory::Leisure),
            &connection,
        )
        .unwrap();

        let updated = update_expense(
            expense.id,
            user.id,
            ExpenseUpdate {
                category: Some(ExpenseCategory::Health),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.category, ExpenseCategory::Health);
        assert_eq!(updated.amount, expense.amount);
        assert_eq!(updated.description, expense.description);
        assert_eq!(updated.date, expense.date);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn update_can_clear_description() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let expense = create_expense(
            user.id,
            new_expense("10.00", ExpenseCategory::Leisure),
            &connection,
        )
        .unwrap();

        let updated = update_expense(
            expense.id,
            user.id,
            ExpenseUpdate {
                description: Some(None),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.description, None);
    }

    #[test]
    fn update_fails_for_other_users_expense() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let expense = create_expense(
            alice.id,
            new_expense("10.00", ExpenseCategory::Leisure),
            &connection,
        )
        .unwrap();

        let result = update_expense(
            expense.id,
            bob.id,
            ExpenseUpdate {
                category: Some(ExpenseCategory::Health),
                ..Default::default()
            },
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(
            get_expense(expense.id, alice.id, &connection)
                .unwrap()
                .category,
            ExpenseCategory::Leisure
        );
    }

    #[test]
    fn delete_twice_fails_with_not_found() {
        let connection = get_test_connection();
        let user = create_test_user("alice", &connection);
        let expense = create_expense(
            user.id,
            new_expense("10.00", ExpenseCategory::Leisure),
            &connection,
        )
        .unwrap();

        assert_eq!(delete_expense(expense.id, user.id, &connection), Ok(()));
        assert_eq!(
            delete_expense(expense.id, user.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            get_expense(expense.id, user.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_fails_for_other_users_expense() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let expense = create_expense(
            alice.id,
            new_expense("10.00", ExpenseCategory::Leisure),
            &connection,
        )
        .unwrap();

        assert_eq!(
            delete_expense(expense.id, bob.id, &connection),
            Err(Error::NotFound)
        );
        assert!(get_expense(expense.id, alice.id, &connection).is_ok());
    }
}
