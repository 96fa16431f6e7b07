//! Trade safeguards

pub mod engine;

pub use engine::*;
