use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{
    daily_totals, is_within_limit, summarize, top_categories, total_by_category, Cents,
    CategoryTotal, DailyTotal, Expense, ExpenseFilter, ExpenseId, ExpenseRow, SpendingSummary,
};
use crate::storage::ExpenseStore;

use super::LedgerError;

/// How many categories the "top spending" view shows by default.
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

/// Everything the statistics view shows, computed from one read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub summary: SpendingSummary,
    pub by_category: Vec<CategoryTotal>,
    pub daily: Vec<DailyTotal>,
    pub top_categories: Vec<CategoryTotal>,
}

/// Expense operations for any client (CLI, tests, a future UI).
///
/// Stateless over the store: every call reads what it needs and nothing is
/// cached between calls.
pub struct Ledger {
    store: ExpenseStore,
}

impl Ledger {
    /// Create a ledger over an already connected store.
    pub fn new(store: ExpenseStore) -> Self {
        Self { store }
    }

    /// Connect to the database and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, LedgerError> {
        let store = ExpenseStore::connect(database_url).await?;
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &ExpenseStore {
        &self.store
    }

    // ========================
    // Mutations
    // ========================

    /// Record a new expense.
    ///
    /// Rejects a zero amount, an amount beyond `MAX_AMOUNT_CENTS`, or a blank
    /// category/description without touching the store. Positivity of the
    /// amount is the entry form's job.
    pub async fn add_expense(
        &self,
        date: NaiveDate,
        amount_cents: Cents,
        category: &str,
        description: &str,
    ) -> Result<ExpenseId, LedgerError> {
        if amount_cents == 0 {
            return Err(LedgerError::MissingField("amount"));
        }
        if !is_within_limit(amount_cents) {
            return Err(LedgerError::AmountOutOfRange(amount_cents));
        }
        if category.trim().is_empty() {
            return Err(LedgerError::MissingField("category"));
        }
        if description.trim().is_empty() {
            return Err(LedgerError::MissingField("description"));
        }

        let expense = Expense::new(date, amount_cents, category, description);
        Ok(self.store.insert(&expense).await?)
    }

    /// Delete the expense shown at zero-based `position` in the default
    /// (newest first) order, returning what was removed.
    pub async fn delete_expense(&self, position: usize) -> Result<ExpenseRow, LedgerError> {
        match self.store.delete_at_position(position).await? {
            Some(removed) => Ok(removed),
            None => {
                warn!(position, "delete requested for a row that does not exist");
                Err(LedgerError::PositionOutOfRange { position })
            }
        }
    }

    /// Delete by permanent identifier. Unknown ids are silently ignored.
    pub async fn delete_expense_by_id(&self, id: ExpenseId) -> Result<(), LedgerError> {
        Ok(self.store.delete_by_id(id).await?)
    }

    /// Overwrite the whole table with `expenses`. Nothing is written if any
    /// amount is beyond the limit.
    pub async fn replace_all(&self, expenses: &[Expense]) -> Result<usize, LedgerError> {
        if let Some(bad) = expenses.iter().find(|e| !is_within_limit(e.amount_cents)) {
            return Err(LedgerError::AmountOutOfRange(bad.amount_cents));
        }
        Ok(self.store.replace_all(expenses).await?)
    }

    // ========================
    // Queries
    // ========================

    pub async fn get_expenses(&self) -> Result<Vec<Expense>, LedgerError> {
        Ok(self.store.load_all().await?)
    }

    pub async fn get_expenses_with_ids(&self) -> Result<Vec<ExpenseRow>, LedgerError> {
        Ok(self.store.load_all_with_ids().await?)
    }

    /// All expenses matching every bound set on `filter`, newest first.
    pub async fn filter_expenses(
        &self,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Expense>, LedgerError> {
        let expenses = self.get_expenses().await?;
        Ok(filter.apply(expenses))
    }

    /// Spending per category, largest first.
    pub async fn total_by_category(&self) -> Result<Vec<CategoryTotal>, LedgerError> {
        let expenses = self.get_expenses().await?;
        Ok(total_by_category(&expenses))
    }

    pub async fn top_categories(&self, limit: usize) -> Result<Vec<CategoryTotal>, LedgerError> {
        let expenses = self.get_expenses().await?;
        Ok(top_categories(&expenses, limit))
    }

    /// Spending per day, oldest first.
    pub async fn daily_totals(&self) -> Result<Vec<DailyTotal>, LedgerError> {
        let expenses = self.get_expenses().await?;
        Ok(daily_totals(&expenses))
    }

    /// Total, mean and largest expense. `None` when nothing is recorded.
    pub async fn summary(&self) -> Result<Option<SpendingSummary>, LedgerError> {
        let expenses = self.get_expenses().await?;
        Ok(summarize(&expenses))
    }

    /// Summary, category split, daily series and top categories over the
    /// same snapshot. `None` when nothing is recorded.
    pub async fn statistics(&self, top: usize) -> Result<Option<Statistics>, LedgerError> {
        let expenses = self.get_expenses().await?;
        let Some(summary) = summarize(&expenses) else {
            return Ok(None);
        };

        Ok(Some(Statistics {
            summary,
            by_category: total_by_category(&expenses),
            daily: daily_totals(&expenses),
            top_categories: top_categories(&expenses, top),
        }))
    }
}
