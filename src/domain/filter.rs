use chrono::NaiveDate;

use super::{Cents, Expense};

/// Conjunctive filter over expenses. Every bound left as `None` (or an empty
/// category list) is not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub min_amount: Option<Cents>,
    pub max_amount: Option<Cents>,
}

impl ExpenseFilter {
    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }

    /// Both date bounds are inclusive, as are both amount bounds.
    pub fn matches(&self, expense: &Expense) -> bool {
        if self.start_date.is_some_and(|start| expense.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| expense.date > end) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| *c == expense.category) {
            return false;
        }
        if self.min_amount.is_some_and(|min| expense.amount_cents < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| expense.amount_cents > max) {
            return false;
        }
        true
    }

    /// Keep matching expenses, preserving their order.
    pub fn apply(&self, expenses: Vec<Expense>) -> Vec<Expense> {
        if self.is_unbounded() {
            return expenses;
        }
        expenses.into_iter().filter(|e| self.matches(e)).collect()
    }
}
