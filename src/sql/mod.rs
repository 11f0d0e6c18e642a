//! Safe SQL builder: identifiers only from validated intents or the table allow-list, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
