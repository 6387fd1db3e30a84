use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Cents, Expense};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Cents,
    pub count: i64,
    /// Share of all spending, 0.0..=100.0.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Cents,
}

/// Headline metrics shown above the charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub count: i64,
    pub total: Cents,
    /// Mean rounded half away from zero to the nearest cent.
    pub average: Cents,
    pub largest: Cents,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// Sum amounts per category, largest total first.
/// Categories with equal totals stay in alphabetical order.
///
/// Sums saturate at the `i64` bounds. Amounts accepted through the ledger are
/// capped at `MAX_AMOUNT_CENTS`, so only rows written around it can get there.
pub fn total_by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<&str, (Cents, i64)> = BTreeMap::new();
    for expense in expenses {
        let entry = groups.entry(expense.category.as_str()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(expense.amount_cents);
        entry.1 += 1;
    }

    let grand_total = groups
        .values()
        .fold(0, |sum: Cents, (total, _)| sum.saturating_add(*total));

    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
            percentage: if grand_total == 0 {
                0.0
            } else {
                total as f64 / grand_total as f64 * 100.0
            },
        })
        .collect();

    totals.sort_by(|a, b| b.total.cmp(&a.total));
    totals
}

/// The `limit` biggest categories.
pub fn top_categories(expenses: &[Expense], limit: usize) -> Vec<CategoryTotal> {
    let mut totals = total_by_category(expenses);
    totals.truncate(limit);
    totals
}

/// Sum amounts per calendar day, oldest day first.
pub fn daily_totals(expenses: &[Expense]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, Cents> = BTreeMap::new();
    for expense in expenses {
        let total = days.entry(expense.date).or_insert(0);
        *total = total.saturating_add(expense.amount_cents);
    }
    days.into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

/// `None` when there is nothing to summarize.
pub fn summarize(expenses: &[Expense]) -> Option<SpendingSummary> {
    let first = expenses.first()?;

    let mut summary = SpendingSummary {
        count: 0,
        total: 0,
        average: 0,
        largest: first.amount_cents,
        first_date: first.date,
        last_date: first.date,
    };

    for expense in expenses {
        summary.count += 1;
        summary.total = summary.total.saturating_add(expense.amount_cents);
        summary.largest = summary.largest.max(expense.amount_cents);
        summary.first_date = summary.first_date.min(expense.date);
        summary.last_date = summary.last_date.max(expense.date);
    }

    summary.average = rounded_div(summary.total, summary.count);
    Some(summary)
}

fn rounded_div(numerator: Cents, denominator: i64) -> Cents {
    let half = denominator / 2;
    if numerator >= 0 {
        numerator.saturating_add(half) / denominator
    } else {
        numerator.saturating_sub(half) / denominator
    }
}
