// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use outlay::application::Ledger;
use outlay::domain::Expense;
use tempfile::TempDir;

/// Helper to create a ledger over a fresh temporary database
pub async fn test_ledger() -> Result<(Ledger, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("expenses.db");
    let ledger = Ledger::connect(&format!("sqlite://{}", db_path.display())).await?;
    Ok((ledger, temp_dir))
}

/// Helper to parse a YYYY-MM-DD string
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: the two-row scenario used throughout
pub struct Scenario;

impl Scenario {
    /// Lunch on 2024-01-01 (50.00) and a bus ride on 2024-01-02 (20.00)
    pub async fn lunch_and_bus(ledger: &Ledger) -> Result<()> {
        ledger
            .add_expense(date("2024-01-01"), 5000, "Food & Dining", "Lunch")
            .await?;
        ledger
            .add_expense(date("2024-01-02"), 2000, "Transportation", "Bus")
            .await?;
        Ok(())
    }

    /// A week of mixed spending, inserted out of date order
    pub async fn mixed_week(ledger: &Ledger) -> Result<Vec<Expense>> {
        let expenses = vec![
            Expense::new(date("2024-02-03"), 1250, "Food & Dining", "Groceries"),
            Expense::new(date("2024-02-01"), 90000, "Housing", "Rent"),
            Expense::new(date("2024-02-05"), 4599, "Utilities", "Electricity"),
            Expense::new(date("2024-02-02"), 275, "Transportation", "Metro"),
            Expense::new(date("2024-02-03"), 3000, "Entertainment", "Cinema"),
            Expense::new(date("2024-02-07"), 1899, "Food & Dining", "Pizza"),
        ];
        for e in &expenses {
            ledger
                .add_expense(e.date, e.amount_cents, &e.category, &e.description)
                .await?;
        }
        Ok(expenses)
    }
}
