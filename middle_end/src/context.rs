//! Per-tenant program context
//!
//! Holds the active program, at most one debug session and the run
//! history of one tenant, on top of a registry shared with everyone else.

use crate::debugger::DebugSession;
use crate::error::{EngineError, Result};
use crate::instruction::{Architecture, Label, Variable};
use crate::interpreter::{HaltReason, RunResult};
use crate::program::{Program, ProgramSummary};
use crate::registry::{CommitReport, EntryKind, RegistrationBatch, Registry, TenantId};
use front_end::document::ProgramDocument;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// One finished run of the active program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub index: usize,
    pub program: String,
    pub level: usize,
    pub input: Vec<u64>,
    pub y: u64,
    pub cycles: u64,
    pub architecture: Architecture,
    pub halt_reason: HaltReason,
}

pub struct ProgramContext {
    registry: Arc<Registry>,
    tenant: TenantId,
    active: Option<String>,
    session: Option<(usize, DebugSession)>,
    /// Selectively expanded copy of the active program
    view: Option<Program>,
    history: Vec<RunRecord>,
}

impl ProgramContext {
    pub fn new(registry: Arc<Registry>, tenant: impl Into<TenantId>) -> Self {
        Self {
            registry,
            tenant: tenant.into(),
            active: None,
            session: None,
            view: None,
            history: Vec::new(),
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Register a document's program and functions, then make the program active
    pub fn load(&mut self, document: &ProgramDocument) -> Result<CommitReport> {
        let report = RegistrationBatch::from_document(self.tenant.clone(), document).commit(&self.registry)?;
        self.active = Some(document.name.clone());
        self.view = None;
        info!(tenant = %self.tenant, program = %document.name, "program loaded");
        Ok(report)
    }

    /// Make an already registered program active
    pub fn select(&mut self, name: &str) -> Result<()> {
        match self.registry.kind(name) {
            Some(EntryKind::Program) => {
                self.active = Some(name.to_string());
                self.view = None;
                Ok(())
            }
            _ => Err(EngineError::UnknownName(name.to_string())),
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The active program, unexpanded
    pub fn program(&self) -> Result<Program> {
        let name = self.active.as_deref().ok_or(EngineError::NoActiveProgram)?;
        self.registry.lookup(name)
    }

    pub fn expand(&self, level: usize) -> Result<Program> {
        Ok(self.program()?.expand(level))
    }

    pub fn max_level(&self) -> Result<usize> {
        Ok(self.program()?.max_expansion_level())
    }

    /// Labels at `level`, sorted numerically with `EXIT` last
    pub fn labels(&self, level: usize) -> Result<Vec<Label>> {
        Ok(self.expand(level)?.sorted_labels())
    }

    /// Variables at `level`, sorted by letter then number
    pub fn variables(&self, level: usize) -> Result<Vec<Variable>> {
        Ok(self.expand(level)?.variables().iter().copied().collect())
    }

    /// Input variables of the active program in first-seen order
    pub fn inputs(&self) -> Result<Vec<Variable>> {
        Ok(self.program()?.inputs().to_vec())
    }

    pub fn summary(&self, level: usize) -> Result<ProgramSummary> {
        Ok(self.expand(level)?.summary())
    }

    pub fn can_run(&self, level: usize, architecture: Architecture) -> Result<bool> {
        Ok(self.expand(level)?.can_run_on(architecture))
    }

    pub fn execute(&mut self, input: &[u64], level: usize) -> Result<RunResult> {
        let program = self.expand(level)?;
        let result = program.execute(input);
        self.record(&program, level, input, &result);
        Ok(result)
    }

    /// Run with a cycle budget; a run cut short reports `INSUFFICIENT_RESOURCES`
    pub fn execute_with_budget(&mut self, input: &[u64], level: usize, budget: u64) -> Result<RunResult> {
        let program = self.expand(level)?;
        let result = program.execute_with_budget(input, budget);
        self.record(&program, level, input, &result);
        Ok(result)
    }

    pub fn history(&self) -> &[RunRecord] {
        &self.history
    }

    // selective expansion

    /// Expand one instruction of the view, which starts as the unexpanded program
    pub fn expand_at(&mut self, index: usize) -> Result<bool> {
        self.view_mut()?.expand_at(index)
    }

    pub fn collapse_at(&mut self, index: usize) -> Result<bool> {
        self.view_mut()?.collapse_at(index)
    }

    pub fn view(&self) -> Option<&Program> {
        self.view.as_ref()
    }

    pub fn reset_view(&mut self) {
        self.view = None;
    }

    // debugging

    pub fn start_debug(
        &mut self,
        input: &[u64],
        level: usize,
        breakpoints: impl IntoIterator<Item = usize>,
    ) -> Result<RunResult> {
        if self.session.is_some() {
            return Err(EngineError::SessionAlreadyActive);
        }
        let program = self.expand(level)?;
        let mut session = DebugSession::new(program, input.to_vec());
        let result = session.start(breakpoints)?;
        self.session = Some((level, session));
        Ok(self.settle(result))
    }

    pub fn step_over(&mut self) -> Result<RunResult> {
        let result = self.session_mut()?.step_over()?;
        Ok(self.settle(result))
    }

    pub fn resume(&mut self) -> Result<RunResult> {
        let result = self.session_mut()?.resume()?;
        Ok(self.settle(result))
    }

    pub fn step_back(&mut self) -> Result<RunResult> {
        self.session_mut()?.step_back()
    }

    pub fn stop_debug(&mut self) -> Result<RunResult> {
        let result = self.session_mut()?.stop()?;
        Ok(self.settle(result))
    }

    pub fn set_breakpoint(&mut self, index: usize) -> Result<()> {
        self.session_mut()?.set_breakpoint(index)
    }

    pub fn remove_breakpoint(&mut self, index: usize) -> Result<bool> {
        Ok(self.session_mut()?.remove_breakpoint(index))
    }

    pub fn debug_session(&self) -> Option<&DebugSession> {
        self.session.as_ref().map(|(_, session)| session)
    }

    pub fn is_debugging(&self) -> bool {
        self.session.is_some()
    }

    // dependencies

    pub fn programs_using(&self, function: &str) -> Result<Vec<String>> {
        self.registry.programs_using(function)
    }

    pub fn all_functions_in_chain(&self, name: &str) -> Result<Vec<String>> {
        self.registry.all_functions_in_chain(name)
    }

    fn view_mut(&mut self) -> Result<&mut Program> {
        if self.view.is_none() {
            self.view = Some(self.program()?);
        }
        self.view.as_mut().ok_or(EngineError::NoActiveProgram)
    }

    fn session_mut(&mut self) -> Result<&mut DebugSession> {
        self.session
            .as_mut()
            .map(|(_, session)| session)
            .ok_or(EngineError::NoActiveSession)
    }

    /// Release a session that has ended and record its run
    fn settle(&mut self, result: RunResult) -> RunResult {
        if result.halt_reason.is_some() {
            if let Some((level, session)) = self.session.take() {
                self.record(session.program(), level, session.input(), &result);
            }
        }
        result
    }

    fn record(&mut self, program: &Program, level: usize, input: &[u64], result: &RunResult) {
        let Some(halt_reason) = result.halt_reason else {
            return;
        };
        if let Some(name) = &self.active {
            self.registry.record_run(name, result.cycles);
        }
        self.history.push(RunRecord {
            index: self.history.len() + 1,
            program: program.name().to_string(),
            level,
            input: input.to_vec(),
            y: result.y,
            cycles: result.cycles,
            architecture: program.minimum_architecture(),
            halt_reason,
        });
    }
}
