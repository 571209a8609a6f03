//! The tool dispatch loop (runs, budgets, event sinks).

pub mod events;
pub mod limits;
pub mod runner;
pub mod types;

pub use events::*;
pub use limits::RunLimits;
pub use runner::*;
pub use types::*;
