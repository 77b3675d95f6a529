//! Engine error type
//!
//! Build-time errors fail fast and carry enough context to print as-is.
//! Usage errors (debugger misuse) leave all state untouched.

use front_end::error::{DocumentError, ParseError};
use front_end::types::Label;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("invalid program `{program}`: jump target {label} is not defined")]
    UndefinedLabel { program: String, label: Label },

    #[error("cannot parse arguments `{expression}` of `{function}`: {source}")]
    ArgumentSyntax {
        function: String,
        expression: String,
        #[source]
        source: ParseError,
    },

    #[error("`{function}` takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("name `{name}` is already registered by tenant `{owner}`")]
    NameTaken { name: String, owner: String },

    #[error("`{name}` is already registered as a {existing}")]
    KindConflict { name: String, existing: &'static str },

    #[error("`{0}` appears more than once in the same registration")]
    DuplicateInBatch(String),

    #[error("recursive definition detected while compiling `{0}`")]
    RecursiveDefinition(String),

    #[error("no function or program named `{0}`")]
    UnknownName(String),

    #[error("no program is loaded")]
    NoActiveProgram,

    #[error("a debug session is already active")]
    SessionAlreadyActive,

    #[error("no debug session is active")]
    NoActiveSession,

    #[error("nothing to step back to")]
    NothingToUndo,

    #[error("breakpoint {index} is outside the program ({len} instructions)")]
    BreakpointOutOfRange { index: usize, len: usize },

    #[error("instruction {index} is outside the program ({len} instructions)")]
    InstructionOutOfRange { index: usize, len: usize },
}

impl EngineError {
    /// Errors caused by calling debugger or view operations in the wrong state
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            EngineError::SessionAlreadyActive
                | EngineError::NoActiveSession
                | EngineError::NothingToUndo
                | EngineError::BreakpointOutOfRange { .. }
                | EngineError::InstructionOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
