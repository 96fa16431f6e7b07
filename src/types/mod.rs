//! Core data types and structures

pub mod trade;
pub mod swap;
pub mod report;

pub use trade::*;
pub use swap::*;
pub use report::*;
