use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, error, info};

use crate::domain::{Expense, ExpenseId, ExpenseRow};

use super::SCHEMA;

const DATE_FORMAT: &str = "%Y-%m-%d";

// Every read shares one display order. Ties on the same day put the most
// recently inserted row first so positions are stable between reads.
const SELECT_EXPENSES: &str =
    "SELECT date, amount, category, description FROM expenses ORDER BY date DESC, id DESC";

const SELECT_EXPENSE_ROWS: &str =
    "SELECT id, date, amount, category, description FROM expenses ORDER BY date DESC, id DESC";

const SELECT_EXPENSE_AT_POSITION: &str = "SELECT id, date, amount, category, description FROM expenses ORDER BY date DESC, id DESC LIMIT 1 OFFSET ?";

const INSERT_EXPENSE: &str =
    "INSERT INTO expenses (date, amount, category, description) VALUES (?, ?, ?, ?)";

/// Sole owner of the `expenses` table and the only place SQL is issued.
///
/// Every backend failure is logged here before it is returned, so callers
/// only have to decide how to present it.
#[derive(Clone)]
pub struct ExpenseStore {
    pool: SqlitePool,
}

impl ExpenseStore {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Wrap an existing pool. The schema is assumed to be in place.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database named by `database_url` and make sure the
    /// `expenses` table exists.
    ///
    /// Accepts `sqlite:` URLs (`sqlite://expenses.db`, `sqlite::memory:`) or a
    /// bare file path. Missing database files are created.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let options = if database_url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(database_url)
                .with_context(|| format!("Invalid database URL: {}", database_url))?
        } else {
            SqliteConnectOptions::new().filename(database_url)
        };
        let options = options.create_if_missing(true);

        let pool = Self::pool_options(in_memory)
            .connect_with(options)
            .await
            .map_err(|e| backend_error("connect to database", e))?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        info!(database = %database_url, "expense store ready");
        Ok(store)
    }

    /// Each connection to an in-memory database gets its own private
    /// database, so such a pool holds exactly one connection and never
    /// retires it.
    fn pool_options(in_memory: bool) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(Self::ACQUIRE_TIMEOUT);
        if in_memory {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(5)
        }
    }

    /// Create the `expenses` table if it is missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| backend_error("create expenses table", e))?;
        Ok(())
    }

    /// Every expense in display order, without identifiers.
    pub async fn load_all(&self) -> Result<Vec<Expense>> {
        let rows = sqlx::query(SELECT_EXPENSES)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| backend_error("load expenses", e))?;

        let expenses = rows
            .iter()
            .map(Self::row_to_expense)
            .collect::<Result<Vec<_>>>()
            .inspect_err(|e| error!(error = %e, "stored expense row is malformed"))?;

        debug!(count = expenses.len(), "loaded expenses");
        Ok(expenses)
    }

    /// Every expense in display order, with identifiers.
    pub async fn load_all_with_ids(&self) -> Result<Vec<ExpenseRow>> {
        let rows = sqlx::query(SELECT_EXPENSE_ROWS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| backend_error("load expenses with ids", e))?;

        let expenses = rows
            .iter()
            .map(Self::row_to_expense_row)
            .collect::<Result<Vec<_>>>()
            .inspect_err(|e| error!(error = %e, "stored expense row is malformed"))?;

        debug!(count = expenses.len(), "loaded expenses with ids");
        Ok(expenses)
    }

    /// Append one expense and return its new identifier.
    /// No validation happens here.
    pub async fn insert(&self, expense: &Expense) -> Result<ExpenseId> {
        let result = insert_query(expense)
            .execute(&self.pool)
            .await
            .map_err(|e| backend_error("insert expense", e))?;

        let id = result.last_insert_rowid();
        debug!(id, date = %expense.date, amount = expense.amount_cents, "inserted expense");
        Ok(id)
    }

    /// Remove the expense with the given identifier. An unknown id is not an
    /// error; nothing is removed.
    pub async fn delete_by_id(&self, id: ExpenseId) -> Result<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| backend_error("delete expense", e))?;

        debug!(id, rows = result.rows_affected(), "deleted expense by id");
        Ok(())
    }

    /// Resolve a zero-based display position and delete that row inside one
    /// transaction, so the row removed is the one at `position` when the
    /// statement runs. Returns the removed row, or `None` if the position is
    /// past the end of the table.
    pub async fn delete_at_position(&self, position: usize) -> Result<Option<ExpenseRow>> {
        let Ok(offset) = i64::try_from(position) else {
            return Ok(None);
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend_error("begin delete transaction", e))?;

        let row = sqlx::query(SELECT_EXPENSE_AT_POSITION)
            .bind(offset)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| backend_error("look up expense position", e))?;

        let Some(row) = row else {
            debug!(position, "no expense at position");
            return Ok(None);
        };
        let target = Self::row_to_expense_row(&row)
            .inspect_err(|e| error!(error = %e, "stored expense row is malformed"))?;

        sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(target.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| backend_error("delete expense", e))?;

        tx.commit()
            .await
            .map_err(|e| backend_error("commit delete transaction", e))?;

        debug!(position, id = target.id, "deleted expense at position");
        Ok(Some(target))
    }

    /// Clear the table and insert `expenses` in their given order, all in one
    /// transaction. Identifiers are reassigned; old ones are never reused.
    pub async fn replace_all(&self, expenses: &[Expense]) -> Result<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend_error("begin replace transaction", e))?;

        let cleared = sqlx::query("DELETE FROM expenses")
            .execute(&mut *tx)
            .await
            .map_err(|e| backend_error("clear expenses", e))?
            .rows_affected();

        for expense in expenses {
            insert_query(expense)
                .execute(&mut *tx)
                .await
                .map_err(|e| backend_error("insert expense during replace", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| backend_error("commit replace transaction", e))?;

        info!(cleared, inserted = expenses.len(), "replaced all expenses");
        Ok(expenses.len())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_expense(row: &SqliteRow) -> Result<Expense> {
        let date_str: String = row.try_get("date")?;
        Ok(Expense {
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .with_context(|| format!("Invalid expense date: {}", date_str))?,
            amount_cents: row.try_get("amount")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
        })
    }

    fn row_to_expense_row(row: &SqliteRow) -> Result<ExpenseRow> {
        Ok(ExpenseRow {
            id: row.try_get("id")?,
            expense: Self::row_to_expense(row)?,
        })
    }
}

fn insert_query(expense: &Expense) -> Query<'static, Sqlite, SqliteArguments<'static>> {
    sqlx::query(INSERT_EXPENSE)
        .bind(expense.date.format(DATE_FORMAT).to_string())
        .bind(expense.amount_cents)
        .bind(expense.category.clone())
        .bind(expense.description.clone())
}

fn backend_error(action: &str, err: sqlx::Error) -> anyhow::Error {
    error!(action, error = %err, "expense store operation failed");
    anyhow::Error::new(err).context(format!("Failed to {}", action))
}
