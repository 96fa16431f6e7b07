//! Chain access and retry plumbing

pub mod ledger;
pub mod providers;
pub mod retry;

pub use ledger::*;
pub use providers::*;
pub use retry::*;
