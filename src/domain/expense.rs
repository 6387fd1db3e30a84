use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{format_cents, Cents};

/// Database-assigned row identifier. Never reused once handed out.
pub type ExpenseId = i64;

/// One dated, categorized spending entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub date: NaiveDate,
    pub amount_cents: Cents,
    pub category: String,
    pub description: String,
}

impl Expense {
    pub fn new(
        date: NaiveDate,
        amount_cents: Cents,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount_cents,
            category: category.into(),
            description: description.into(),
        }
    }

    pub fn amount(&self) -> String {
        format_cents(self.amount_cents)
    }
}

/// An expense together with its identifier, for row-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub id: ExpenseId,
    #[serde(flatten)]
    pub expense: Expense,
}

/// The fixed set of labels offered by the add and filter forms.
///
/// The store keeps categories as free text; only input is restricted to this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    FoodAndDining,
    Transportation,
    Housing,
    Utilities,
    Entertainment,
    Shopping,
    Healthcare,
    Education,
    Travel,
    PersonalCare,
    GiftsAndDonations,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::FoodAndDining,
        Category::Transportation,
        Category::Housing,
        Category::Utilities,
        Category::Entertainment,
        Category::Shopping,
        Category::Healthcare,
        Category::Education,
        Category::Travel,
        Category::PersonalCare,
        Category::GiftsAndDonations,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FoodAndDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Housing => "Housing",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Travel => "Travel",
            Category::PersonalCare => "Personal Care",
            Category::GiftsAndDonations => "Gifts & Donations",
            Category::Other => "Other",
        }
    }

    /// Match a label case-insensitively, ignoring surrounding whitespace.
    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(Category::as_str).collect()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(pub String);

impl std::fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown category '{}' (expected one of: {})",
            self.0,
            Category::labels().join(", ")
        )
    }
}

impl std::error::Error for ParseCategoryError {}

/// Input rules enforced by the entry form before anything reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NonPositiveAmount(Cents),
    EmptyDescription,
    FutureDate { date: NaiveDate, today: NaiveDate },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NonPositiveAmount(cents) => {
                write!(f, "Amount must be greater than zero (got {})", format_cents(*cents))
            }
            ValidationError::EmptyDescription => write!(f, "Please provide a description"),
            ValidationError::FutureDate { date, today } => {
                write!(f, "Date {} is in the future (today is {})", date, today)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a new entry against the form rules: positive amount, non-blank
/// description, and a date no later than `today`.
pub fn validate_new_expense(
    date: NaiveDate,
    amount_cents: Cents,
    description: &str,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if amount_cents <= 0 {
        return Err(ValidationError::NonPositiveAmount(amount_cents));
    }
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if date > today {
        return Err(ValidationError::FutureDate { date, today });
    }
    Ok(())
}
