//! Trade scheduling and execution

pub mod amounts;
pub mod engine;
pub mod timer;

pub use engine::*;
pub use timer::*;
