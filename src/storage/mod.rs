//! Data persistence and file operations

pub mod schedule;
pub mod reports;

pub use schedule::*;
pub use reports::*;
