mod store;

pub use store::*;

/// Bootstrap schema for the `expenses` table.
pub const SCHEMA: &str = include_str!("schema.sql");
