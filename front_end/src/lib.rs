pub mod token;
pub mod ast;
pub mod types;
pub mod parser;
pub mod lexer;
pub mod error;
pub mod source_location;
pub mod document;
pub mod diagnostics_reporter;

#[cfg(test)]
mod tests;
