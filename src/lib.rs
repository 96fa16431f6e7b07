//! AMM Volume Bot - scheduled buy/sell alternation against a Uniswap-V2 style router
//!
//! Splits each buy into randomly delayed tranches, sells the accumulated
//! position after a randomised delay, and persists its schedule so a restart
//! resumes where it left off.

pub mod config;
pub mod types;
pub mod errors;
pub mod network;
pub mod safeguards;
pub mod orchestrator;
pub mod notify;
pub mod storage;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use errors::{BotError, BotResult};
pub use orchestrator::TradeOrchestrator;
pub use types::*;
