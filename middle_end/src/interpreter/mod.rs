//! Execution engine
//!
//! Runs a [`Program`](crate::program::Program) against natural-number
//! inputs, one instruction at a time. The same single-step primitive backs
//! the debugger, which additionally records reversible step deltas.

mod core;
mod result;
mod state;

#[cfg(test)]
mod tests;

// Re-export main components
pub use self::core::Interpreter;
pub use result::{HaltReason, RunResult};
pub use state::{ExecutionState, StepDelta, VariableChange};
pub(crate) use state::Effect;
