//! Tests for the front end: names, argument expressions and documents

mod ast_tests;
mod document_tests;
