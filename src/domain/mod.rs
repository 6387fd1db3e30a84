mod expense;
mod filter;
mod money;
mod report;

pub use expense::*;
pub use filter::*;
pub use money::*;
pub use report::*;
