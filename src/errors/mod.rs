//! Error taxonomy shared by the retry executor and the orchestrator

pub mod bot_error;

pub use bot_error::*;
