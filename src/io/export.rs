use anyhow::Result;
use std::io::Write;

use crate::application::Ledger;
use crate::domain::{Expense, ExpenseFilter};

use super::CSV_HEADER;

/// Writes ledger views out as CSV.
pub struct Exporter<'a> {
    ledger: &'a Ledger,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Export the expenses matching `filter`. Returns the number of rows written.
    pub async fn export_filtered_csv<W: Write>(
        &self,
        filter: &ExpenseFilter,
        writer: W,
    ) -> Result<usize> {
        let expenses = self.ledger.filter_expenses(filter).await?;
        write_expenses_csv(&expenses, writer)
    }
}

/// One header row, then one row per expense in the order given. There is no
/// index column.
pub fn write_expenses_csv<W: Write>(expenses: &[Expense], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for expense in expenses {
        csv_writer.write_record([
            expense.date.format("%Y-%m-%d").to_string(),
            expense.amount(),
            expense.category.clone(),
            expense.description.clone(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(expenses.len())
}
