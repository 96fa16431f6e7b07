//! Configuration management for the volume bot

pub mod settings;

pub use settings::*;
