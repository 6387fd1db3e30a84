// Application layer: the expense-facing API used by the CLI.

pub mod error;
mod ledger;

pub use error::*;
pub use ledger::*;
