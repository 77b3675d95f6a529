pub mod error;
pub mod instruction;
pub mod lowering;
pub mod program;
pub mod converter;
pub mod interpreter;
pub mod debugger;
pub mod registry;
pub mod context;

pub use context::ProgramContext;
pub use error::{EngineError, Result};
pub use program::Program;

#[cfg(test)]
mod tests;
