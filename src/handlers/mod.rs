//! HTTP handlers for table queries.

pub mod table;
pub use table::*;
