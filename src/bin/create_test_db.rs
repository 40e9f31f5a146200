use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use expense_tracker::{
    Email, ExpenseCategory, NewExpense, PasswordHash, Username, ValidatedPassword, create_expense,
    create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server of expense_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user \"test\" with the password \"test1234\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test1234"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        Username::new("test")?,
        Email::new("test@example.com")?,
        password_hash,
        &conn,
    )?;

    println!("Creating test expenses...");

    let today = OffsetDateTime::now_utc().date();
    let expenses = [
        ("54.20", ExpenseCategory::Groceries, "Weekly shop", 1),
        ("12.50", ExpenseCategory::Leisure, "Cinema", 3),
        ("89.99", ExpenseCategory::Utilities, "Power bill", 12),
        ("249.00", ExpenseCategory::Electronics, "Headphones", 45),
        ("35.00", ExpenseCategory::Health, "Pharmacy", 80),
        ("60.00", ExpenseCategory::Clothing, "Shoes", 120),
    ];

    for (amount, category, description, days_ago) in expenses {
        let expense = NewExpense::new(
            Decimal::from_str(amount)?,
            category,
            Some(description.to_owned()),
            today - Duration::days(days_ago),
        )?;
        create_expense(user.id, expense, &conn)?;
    }

    println!("Success!");

    Ok(())
}
