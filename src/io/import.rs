use anyhow::Result;
use chrono::NaiveDate;
use std::io::Read;
use tracing::info;

use crate::application::Ledger;
use crate::domain::{parse_cents, Expense};

use super::CSV_HEADER;

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Rows that parsed cleanly (and were written, unless this was a dry run).
    pub imported: usize,
    pub errors: Vec<ImportError>,
    /// True only when the table was actually replaced.
    pub replaced: bool,
}

/// Error that occurred during import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Parse and validate only, leave the table alone.
    pub dry_run: bool,
}

/// Loads a CSV in the export layout and overwrites the whole table with it.
pub struct Importer<'a> {
    ledger: &'a Ledger,
}

impl<'a> Importer<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Replace every stored expense with the rows of `reader`.
    ///
    /// All-or-nothing: if any row is invalid the table is not touched.
    pub async fn import_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let (mut expenses, errors) = read_expenses_csv(reader)?;

        let mut result = ImportResult {
            imported: expenses.len(),
            errors,
            replaced: false,
        };

        if options.dry_run || !result.errors.is_empty() {
            return Ok(result);
        }

        // Exports list newest first. Inserting bottom-up gives the top row
        // the highest id, which keeps same-day rows in their exported order.
        expenses.reverse();
        self.ledger.replace_all(&expenses).await?;
        result.replaced = true;

        info!(rows = result.imported, "imported expenses from csv");
        Ok(result)
    }
}

/// Parse every data row, collecting per-line errors instead of stopping at
/// the first one. Only a missing or wrong header row is fatal.
pub fn read_expenses_csv<R: Read>(reader: R) -> Result<(Vec<Expense>, Vec<ImportError>)> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let found: Vec<&str> = headers.iter().map(str::trim).collect();
    if found != CSV_HEADER {
        anyhow::bail!(
            "Unexpected CSV header '{}'; expected '{}'",
            found.join(","),
            CSV_HEADER.join(",")
        );
    }

    let mut expenses = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let line = index + 2; // header is line 1

        let record = match record {
            Ok(r) => r,
            Err(e) => {
                errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };

        match parse_record(&record) {
            Ok(expense) => expenses.push(expense),
            Err((field, error)) => errors.push(ImportError {
                line,
                field: Some(field.to_string()),
                error,
            }),
        }
    }

    Ok((expenses, errors))
}

fn parse_record(record: &csv::StringRecord) -> Result<Expense, (&'static str, String)> {
    let field = move |index: usize| record.get(index).unwrap_or("").trim();

    let date = NaiveDate::parse_from_str(field(0), "%Y-%m-%d")
        .map_err(|e| ("Date", format!("Invalid date '{}': {}", field(0), e)))?;

    let amount_cents = parse_cents(field(1))
        .map_err(|e| ("Amount", format!("Invalid amount '{}': {}", field(1), e)))?;
    if amount_cents <= 0 {
        return Err(("Amount", "Amount must be greater than zero".to_string()));
    }

    let category = field(2);
    if category.is_empty() {
        return Err(("Category", "Category is empty".to_string()));
    }

    let description = field(3);
    if description.is_empty() {
        return Err(("Description", "Description is empty".to_string()));
    }

    Ok(Expense::new(date, amount_cents, category, description))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_export_layout() {
        let data = "Date,Amount,Category,Description\n\
                    2024-01-02,20.00,Transportation,Bus\n\
                    2024-01-01,50,Food & Dining,\"Lunch, late\"\n";
        let (expenses, errors) = read_expenses_csv(data.as_bytes()).unwrap();
        assert!(errors.is_empty());
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[1].amount_cents, 5000);
        assert_eq!(expenses[1].description, "Lunch, late");
    }

    #[test]
    fn test_collects_row_errors_with_line_numbers() {
        let data = "Date,Amount,Category,Description\n\
                    2024-13-01,20.00,Travel,Taxi\n\
                    2024-01-01,-5,Travel,Taxi\n\
                    2024-01-01,5,Travel,\n\
                    2024-01-01,5,Travel,Fine\n";
        let (expenses, errors) = read_expenses_csv(data.as_bytes()).unwrap();
        assert_eq!(expenses.len(), 1);
        let fields: Vec<(usize, Option<&str>)> = errors
            .iter()
            .map(|e| (e.line, e.field.as_deref()))
            .collect();
        assert_eq!(
            fields,
            vec![(2, Some("Date")), (3, Some("Amount")), (4, Some("Description"))]
        );
    }

    #[test]
    fn test_rejects_unknown_header() {
        let data = "id,when,amount\n1,2024-01-01,5\n";
        assert!(read_expenses_csv(data.as_bytes()).is_err());
    }
}
