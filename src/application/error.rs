use thiserror::Error;

use crate::domain::{format_cents, Cents, MAX_AMOUNT_CENTS};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Amount {} is beyond the {} limit", format_cents(*.0), format_cents(MAX_AMOUNT_CENTS))]
    AmountOutOfRange(Cents),

    #[error("No expense at row {position}")]
    PositionOutOfRange { position: usize },

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl LedgerError {
    /// True for failures caught before the store was touched.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LedgerError::Store(_))
    }
}
