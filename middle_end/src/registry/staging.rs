//! Atomic registration of a program together with its functions
//!
//! Names are validated first, then everything is compiled into a staging
//! area, and only when all of it compiles is the batch committed. A
//! failure at any point leaves the registry exactly as it was.

use super::{Definition, EntryKind, Registry, RegistryInner, TenantId};
use crate::converter::{build_program, FunctionResolver};
use crate::error::{EngineError, Result};
use crate::program::Program;
use front_end::document::{FunctionDocument, InstructionDocument, ProgramDocument};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// What a committed batch registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub tenant: TenantId,
    pub program: Option<String>,
    pub functions: Vec<String>,
}

/// A program bundle staged for registration
#[derive(Debug, Clone)]
pub struct RegistrationBatch {
    tenant: TenantId,
    program: Option<(String, Vec<InstructionDocument>)>,
    functions: Vec<FunctionDocument>,
}

impl RegistrationBatch {
    pub fn new(tenant: impl Into<TenantId>) -> Self {
        Self {
            tenant: tenant.into(),
            program: None,
            functions: Vec::new(),
        }
    }

    /// Stage a whole document: its program and every function it defines
    pub fn from_document(tenant: impl Into<TenantId>, document: &ProgramDocument) -> Self {
        document.functions.iter().cloned().fold(
            Self::new(tenant).with_program(&document.name, document.instructions.clone()),
            Self::with_function,
        )
    }

    pub fn with_program(mut self, name: &str, instructions: Vec<InstructionDocument>) -> Self {
        self.program = Some((name.to_string(), instructions));
        self
    }

    pub fn with_function(mut self, function: FunctionDocument) -> Self {
        self.functions.push(function);
        self
    }

    fn definitions(&self) -> Vec<Definition> {
        let program_name = self.program.as_ref().map(|(name, _)| name.as_str());
        let mut definitions: Vec<Definition> = self
            .functions
            .iter()
            .map(|f| Definition::function(f, &self.tenant, program_name))
            .collect();
        if let Some((name, instructions)) = &self.program {
            definitions.push(Definition::new(
                name,
                EntryKind::Program,
                &self.tenant,
                instructions.clone(),
            ));
        }
        definitions
    }

    /// Validate, compile and install everything, or nothing
    pub fn commit(self, registry: &Registry) -> Result<CommitReport> {
        let definitions = self.definitions();
        let mut inner = registry.inner.write();

        let mut seen = HashSet::new();
        for definition in &definitions {
            if !seen.insert(definition.name.as_str()) {
                return Err(EngineError::DuplicateInBatch(definition.name.clone()));
            }
            inner.check_claim(&self.tenant, &definition.name, definition.kind)?;
        }

        let mut staging = Staging {
            definitions: definitions
                .iter()
                .map(|d| (d.name.clone(), d.clone()))
                .collect(),
            compiled: HashMap::new(),
            building: HashSet::new(),
            inner: &mut *inner,
        };
        for definition in &definitions {
            staging.compile(&definition.name)?;
        }
        let compiled = staging.compiled;

        for definition in &definitions {
            inner.invalidate(&definition.name);
        }
        for definition in definitions.iter().cloned() {
            inner.install(definition);
        }
        for definition in &definitions {
            if let Some(program) = compiled.get(&definition.name) {
                inner.insert_compiled(&self.tenant, &definition.name, Arc::clone(program));
            }
        }

        let report = CommitReport {
            tenant: self.tenant.clone(),
            program: self.program.map(|(name, _)| name),
            functions: self.functions.into_iter().map(|f| f.name).collect(),
        };
        info!(
            tenant = %report.tenant,
            program = ?report.program,
            functions = report.functions.len(),
            "registration committed"
        );
        Ok(report)
    }
}

/// Compiles staged definitions over the registry's own
///
/// Staged definitions shadow registered ones. A registered name whose call
/// chain reaches the batch is recompiled against the staged definitions, so
/// the building guard sees any cycle a redefinition closes.
struct Staging<'a> {
    definitions: HashMap<String, Definition>,
    compiled: HashMap<String, Arc<Program>>,
    building: HashSet<String>,
    inner: &'a mut RegistryInner,
}

impl Staging<'_> {
    fn compile(&mut self, name: &str) -> Result<Arc<Program>> {
        if let Some(program) = self.compiled.get(name) {
            return Ok(Arc::clone(program));
        }
        let instructions = match self.definitions.get(name) {
            Some(definition) => definition.instructions.clone(),
            None => {
                let reaches_batch = self
                    .inner
                    .chain(name)
                    .iter()
                    .any(|callee| self.definitions.contains_key(callee));
                if !reaches_batch {
                    return self.inner.compile(name);
                }
                self.inner
                    .definition(name)
                    .map(|d| d.instructions.clone())
                    .ok_or_else(|| EngineError::UnknownName(name.to_string()))?
            }
        };

        if !self.building.insert(name.to_string()) {
            return Err(EngineError::RecursiveDefinition(name.to_string()));
        }
        let built = build_program(name, &instructions, self);
        self.building.remove(name);

        let program = Arc::new(built?);
        self.compiled.insert(name.to_string(), Arc::clone(&program));
        Ok(program)
    }
}

impl FunctionResolver for Staging<'_> {
    fn resolve(&mut self, name: &str) -> Result<Arc<Program>> {
        self.compile(name)
    }

    fn arity(&mut self, name: &str) -> Result<usize> {
        match self.definitions.get(name) {
            Some(definition) => Ok(definition.arity),
            None => self.inner.arity(name),
        }
    }
}
