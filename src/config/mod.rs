pub mod settings;
pub mod tables;

pub use settings::*;
pub use tables::*;
