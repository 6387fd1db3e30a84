use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use crate::application::{Ledger, DEFAULT_TOP_CATEGORIES};
use crate::config::Config;
use crate::domain::{
    format_cents, parse_cents, validate_new_expense, Category, CategoryTotal, Cents, Expense,
    ExpenseFilter, ExpenseRow,
};

/// Outlay - Personal Expense Tracker
#[derive(Parser)]
#[command(name = "outlay")]
#[command(about = "Track, categorize, and analyze your personal expenses")]
#[command(version)]
pub struct Cli {
    /// Database connection string, e.g. sqlite://expenses.db (defaults to $DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the expenses table if it does not exist
    Init,

    /// Record a new expense
    Add {
        /// Amount spent (e.g., "12.50" or "12")
        amount: String,

        /// Category (see `outlay categories`)
        #[arg(short, long)]
        category: String,

        /// What the money was spent on
        #[arg(short, long)]
        description: String,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List expenses, newest first
    List {
        /// Include the permanent expense IDs
        #[arg(long)]
        ids: bool,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Delete an expense by its row number in `outlay list`, or by ID
    Delete {
        /// Zero-based row number as shown by `outlay list`
        #[arg(required_unless_present = "id", conflicts_with = "id")]
        row: Option<usize>,

        /// Permanent expense ID (see `outlay list --ids`)
        #[arg(long)]
        id: Option<i64>,
    },

    /// Show expenses matching the given criteria
    Filter {
        #[command(flatten)]
        criteria: FilterArgs,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Total spending per category
    Totals {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Summary metrics, category breakdown, daily totals and top categories
    Stats {
        /// How many top categories to show
        #[arg(long, default_value_t = DEFAULT_TOP_CATEGORIES)]
        top: usize,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export (filtered) expenses as CSV
    Export {
        #[command(flatten)]
        criteria: FilterArgs,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replace ALL expenses with the rows of a CSV file in export format
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without touching the database
        #[arg(long)]
        dry_run: bool,
    },

    /// List the available categories
    Categories,
}

/// Filter criteria shared by `filter` and `export`. Every bound is optional.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Earliest date to include (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest date to include (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Category to include; repeat for several (all when omitted)
    #[arg(short, long = "category")]
    pub categories: Vec<String>,

    /// Smallest amount to include
    #[arg(long)]
    pub min: Option<String>,

    /// Largest amount to include
    #[arg(long)]
    pub max: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<ExpenseFilter> {
        let start_date = self.from.as_deref().map(parse_date).transpose()?;
        let end_date = self.to.as_deref().map(parse_date).transpose()?;

        let categories = self
            .categories
            .iter()
            .map(|c| c.parse::<Category>().map(|c| c.as_str().to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        let min_amount = self
            .min
            .as_deref()
            .map(parse_cents)
            .transpose()
            .context("Invalid minimum amount")?;
        let max_amount = self
            .max
            .as_deref()
            .map(parse_cents)
            .transpose()
            .context("Invalid maximum amount")?;

        Ok(ExpenseFilter {
            start_date,
            end_date,
            categories,
            min_amount,
            max_amount,
        })
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // The only command that works without a database.
        if matches!(self.command, Commands::Categories) {
            print_categories();
            return Ok(());
        }

        let config = Config::resolve(self.database_url)?;
        let ledger = Ledger::connect(&config.database_url)
            .await
            .with_context(|| format!("Failed to open database: {}", config.database_url))?;

        let outcome = run_command(&ledger, &config, self.command).await;
        ledger.store().close().await;
        outcome
    }
}

async fn run_command(ledger: &Ledger, config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Database initialized: {}", config.database_url);
        }

        Commands::Add {
            amount,
            category,
            description,
            date,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '12.50' or '12'")?;
            let category: Category = category.parse()?;

            let today = Local::now().date_naive();
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => today,
            };

            validate_new_expense(date, amount_cents, &description, today)?;

            let id = ledger
                .add_expense(date, amount_cents, category.as_str(), description.trim())
                .await
                .context("Failed to add expense")?;

            println!(
                "Expense added: {} {} on {} - {} (id {})",
                format_cents(amount_cents),
                category,
                date,
                description.trim(),
                id
            );
        }

        Commands::List { ids, format } => {
            if ids {
                let rows = ledger.get_expenses_with_ids().await?;
                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                } else if rows.is_empty() {
                    print_no_expenses();
                } else {
                    print_expense_rows(&rows);
                }
            } else {
                let expenses = ledger.get_expenses().await?;
                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&expenses)?);
                } else if expenses.is_empty() {
                    print_no_expenses();
                } else {
                    print_expenses(&expenses);
                }
            }
        }

        Commands::Delete { row, id } => match (row, id) {
            (_, Some(id)) => {
                ledger.delete_expense_by_id(id).await?;
                println!("Deleted expense with id {}", id);
            }
            (Some(row), None) => {
                let removed = ledger
                    .delete_expense(row)
                    .await
                    .context("Failed to delete expense")?;
                println!(
                    "Deleted expense: {} {} {} - {} (id {})",
                    removed.expense.date,
                    removed.expense.amount(),
                    removed.expense.category,
                    removed.expense.description,
                    removed.id
                );
            }
            (None, None) => anyhow::bail!("Specify a row number or --id"),
        },

        Commands::Filter { criteria, format } => {
            let filter = criteria.to_filter()?;
            let expenses = ledger.filter_expenses(&filter).await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&expenses)?);
            } else if expenses.is_empty() {
                println!("No expenses match your filter criteria.");
            } else {
                print_expenses(&expenses);
                let total = expenses
                    .iter()
                    .fold(0, |sum: Cents, e| sum.saturating_add(e.amount_cents));
                println!();
                println!("Total filtered amount: {}", format_cents(total));
            }
        }

        Commands::Totals { format } => {
            let totals = ledger.total_by_category().await?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else if totals.is_empty() {
                print_no_expenses();
            } else {
                print_category_totals(&totals);
            }
        }

        Commands::Stats { top, format } => {
            let stats = ledger.statistics(top).await?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            let Some(stats) = stats else {
                println!("No expenses recorded yet. Add some expenses to see statistics.");
                return Ok(());
            };

            let summary = &stats.summary;
            println!("Summary Statistics");
            println!(
                "  Period:           {} to {}",
                summary.first_date, summary.last_date
            );
            println!("  Expenses:         {}", summary.count);
            println!("  Total Spent:      {}", format_cents(summary.total));
            println!("  Average Expense:  {}", format_cents(summary.average));
            println!("  Largest Expense:  {}", format_cents(summary.largest));

            println!();
            println!("Expenses by Category");
            print_category_totals(&stats.by_category);

            println!();
            println!("Daily Expenses");
            println!("{:<12} {:>12}", "DATE", "AMOUNT");
            println!("{}", "-".repeat(25));
            for day in &stats.daily {
                println!("{:<12} {:>12}", day.date.to_string(), format_cents(day.total));
            }

            println!();
            println!("Top {} Spending Categories", top);
            for (rank, cat) in stats.top_categories.iter().enumerate() {
                println!(
                    "  {}. {:<20} {:>12}",
                    rank + 1,
                    truncate(&cat.category, 20),
                    format_cents(cat.total)
                );
            }
        }

        Commands::Export { criteria, output } => {
            run_export_command(ledger, &criteria, output.as_deref()).await?;
        }

        Commands::Import { input, dry_run } => {
            run_import_command(ledger, input.as_deref(), dry_run).await?;
        }

        Commands::Categories => print_categories(),
    }

    Ok(())
}

async fn run_export_command(
    ledger: &Ledger,
    criteria: &FilterArgs,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let filter = criteria.to_filter()?;
    let exporter = Exporter::new(ledger);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = exporter.export_filtered_csv(&filter, writer).await?;
    if let Some(path) = output {
        eprintln!("Exported {} expenses to {}", count, path);
    }

    Ok(())
}

async fn run_import_command(ledger: &Ledger, input: Option<&str>, dry_run: bool) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{stdin, Read};

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let importer = Importer::new(ledger);
    let result = importer
        .import_csv(reader, ImportOptions { dry_run })
        .await?;

    for err in &result.errors {
        match &err.field {
            Some(field) => eprintln!("  line {} ({}): {}", err.line, field, err.error),
            None => eprintln!("  line {}: {}", err.line, err.error),
        }
    }

    if !result.errors.is_empty() {
        anyhow::bail!(
            "Import aborted: {} invalid row(s); existing expenses left unchanged",
            result.errors.len()
        );
    }

    if result.replaced {
        println!("Replaced all expenses with {} imported row(s)", result.imported);
    } else {
        println!("Dry run: {} row(s) valid, nothing written", result.imported);
    }

    Ok(())
}

fn print_categories() {
    for label in Category::labels() {
        println!("{}", label);
    }
}

fn print_no_expenses() {
    println!("No expenses recorded yet. Use `outlay add` to record your first expense.");
}

fn print_expenses(expenses: &[Expense]) {
    println!(
        "{:>4} {:<12} {:>12} {:<20} {}",
        "ROW", "DATE", "AMOUNT", "CATEGORY", "DESCRIPTION"
    );
    println!("{}", "-".repeat(72));
    for (row, expense) in expenses.iter().enumerate() {
        println!(
            "{:>4} {:<12} {:>12} {:<20} {}",
            row,
            expense.date.to_string(),
            expense.amount(),
            truncate(&expense.category, 20),
            expense.description
        );
    }
}

fn print_expense_rows(rows: &[ExpenseRow]) {
    println!(
        "{:>4} {:>6} {:<12} {:>12} {:<20} {}",
        "ROW", "ID", "DATE", "AMOUNT", "CATEGORY", "DESCRIPTION"
    );
    println!("{}", "-".repeat(79));
    for (position, row) in rows.iter().enumerate() {
        println!(
            "{:>4} {:>6} {:<12} {:>12} {:<20} {}",
            position,
            row.id,
            row.expense.date.to_string(),
            row.expense.amount(),
            truncate(&row.expense.category, 20),
            row.expense.description
        );
    }
}

fn print_category_totals(totals: &[CategoryTotal]) {
    println!(
        "{:<20} {:>12} {:>8} {:>8}",
        "CATEGORY", "TOTAL", "COUNT", "PERCENT"
    );
    println!("{}", "-".repeat(51));
    for cat in totals {
        println!(
            "{:<20} {:>12} {:>8} {:>7.1}%",
            truncate(&cat.category, 20),
            format_cents(cat.total),
            cat.count,
            cat.percentage
        );
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_canonicalize_categories() {
        let args = FilterArgs {
            from: Some("2024-01-01".into()),
            categories: vec!["food & dining".into(), "TRAVEL".into()],
            min: Some("30".into()),
            ..Default::default()
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.categories, vec!["Food & Dining", "Travel"]);
        assert_eq!(filter.min_amount, Some(3000));
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(filter.end_date.is_none());
    }

    #[test]
    fn test_filter_args_reject_bad_input() {
        let bad_category = FilterArgs {
            categories: vec!["Groceries".into()],
            ..Default::default()
        };
        assert!(bad_category.to_filter().is_err());

        let bad_date = FilterArgs {
            to: Some("01/02/2024".into()),
            ..Default::default()
        };
        assert!(bad_date.to_filter().is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("Food & Dining", 20), "Food & Dining");
        assert_eq!(truncate("Gifts & Donations", 10), "Gifts &...");
        assert_eq!(truncate("café au lait", 6), "caf...");
    }

    #[test]
    fn test_cli_parses_delete_variants() {
        let cli = Cli::try_parse_from(["outlay", "delete", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { row: Some(3), id: None }));

        let cli = Cli::try_parse_from(["outlay", "delete", "--id", "42"]).unwrap();
        assert!(matches!(cli.command, Commands::Delete { row: None, id: Some(42) }));

        assert!(Cli::try_parse_from(["outlay", "delete"]).is_err());
    }
}
