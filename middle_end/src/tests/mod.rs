//! Tests for the middle end
//!
//! Shared fixtures live in `support`; each file covers one component.

pub(crate) mod support;
mod lowering_tests;
mod debugger_tests;
