//! Request extractors.

pub mod intent;
pub use intent::IntentQuery;
