mod export;
mod import;

pub use export::*;
pub use import::*;

/// Column headers shared by export and import.
pub const CSV_HEADER: [&str; 4] = ["Date", "Amount", "Category", "Description"];
