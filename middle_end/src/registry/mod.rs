//! Function and program registry
//!
//! One namespace shared by every tenant: a name belongs to at most one
//! tenant, and functions and programs compete for the same names. Raw
//! definitions are stored at registration; compiled programs are cached
//! and built on first need.
//!
//! # Locking
//!
//! All state sits behind a single `RwLock`. Reads (lookup of a cached
//! entry, listings, arity) take the shared lock. Anything that mutates,
//! including filling the compiled cache, takes the exclusive lock. A
//! lookup that misses the cache drops the shared lock, takes the
//! exclusive one and compiles under it; nested callees are compiled
//! through a resolver over the already-locked state, so nothing re-locks.

mod staging;

pub use staging::{CommitReport, RegistrationBatch};

use crate::converter::{build_program, FunctionResolver};
use crate::error::{EngineError, Result};
use crate::program::Program;
use front_end::document::{arity_of, FunctionDocument, InstructionDocument};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Owner of registered names
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
    Function,
    Program,
}

impl EntryKind {
    pub fn describe(&self) -> &'static str {
        match self {
            EntryKind::Function => "function",
            EntryKind::Program => "program",
        }
    }
}

/// Public view of one registry entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub display_name: String,
    pub owner: TenantId,
    pub kind: EntryKind,
    pub arity: usize,
    /// Program whose document introduced this function
    pub defined_in: Option<String>,
    pub instructions: usize,
    /// Known once the entry has been compiled
    pub max_level: Option<usize>,
    pub average_cost: Option<f64>,
}

/// A raw definition as registered
#[derive(Debug, Clone)]
struct Definition {
    name: String,
    kind: EntryKind,
    owner: TenantId,
    display_name: Option<String>,
    defined_in: Option<String>,
    instructions: Vec<InstructionDocument>,
    arity: usize,
    /// Functions called directly, nested argument calls included
    calls: Vec<String>,
}

impl Definition {
    fn new(
        name: &str,
        kind: EntryKind,
        owner: &TenantId,
        instructions: Vec<InstructionDocument>,
    ) -> Self {
        let mut calls: Vec<String> = Vec::new();
        for call in instructions.iter().flat_map(InstructionDocument::called_functions) {
            if !calls.contains(&call) {
                calls.push(call);
            }
        }
        Self {
            name: name.to_string(),
            kind,
            owner: owner.clone(),
            display_name: None,
            defined_in: None,
            arity: arity_of(&instructions),
            instructions,
            calls,
        }
    }

    fn function(document: &FunctionDocument, owner: &TenantId, defined_in: Option<&str>) -> Self {
        let mut definition = Self::new(
            &document.name,
            EntryKind::Function,
            owner,
            document.instructions.clone(),
        );
        definition.display_name = document.user_string.clone();
        definition.defined_in = defined_in.map(String::from);
        definition
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct RunningAverage {
    runs: u64,
    mean: f64,
}

impl RunningAverage {
    fn record(&mut self, cycles: u64) {
        self.runs += 1;
        self.mean += (cycles as f64 - self.mean) / self.runs as f64;
    }

    fn rounded(&self) -> f64 {
        (self.mean * 10.0).round() / 10.0
    }
}

#[derive(Debug, Default)]
struct TenantEntry {
    definitions: HashMap<String, Definition>,
    compiled: HashMap<String, Arc<Program>>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    owners: HashMap<String, TenantId>,
    tenants: HashMap<TenantId, TenantEntry>,
    /// Names currently being compiled
    building: HashSet<String>,
    costs: HashMap<String, RunningAverage>,
}

impl RegistryInner {
    fn definition(&self, name: &str) -> Option<&Definition> {
        let owner = self.owners.get(name)?;
        self.tenants.get(owner)?.definitions.get(name)
    }

    fn cached(&self, name: &str) -> Option<Arc<Program>> {
        let owner = self.owners.get(name)?;
        self.tenants.get(owner)?.compiled.get(name).cloned()
    }

    fn arity(&self, name: &str) -> Result<usize> {
        self.definition(name)
            .map(|d| d.arity)
            .ok_or_else(|| EngineError::UnknownName(name.to_string()))
    }

    /// Fails if `name` belongs to another tenant or to a different kind of entry
    fn check_claim(&self, tenant: &TenantId, name: &str, kind: EntryKind) -> Result<()> {
        match self.owners.get(name) {
            Some(owner) if owner != tenant => Err(EngineError::NameTaken {
                name: name.to_string(),
                owner: owner.to_string(),
            }),
            Some(_) => match self.definition(name) {
                Some(existing) if existing.kind != kind => Err(EngineError::KindConflict {
                    name: name.to_string(),
                    existing: existing.kind.describe(),
                }),
                _ => Ok(()),
            },
            None => Ok(()),
        }
    }

    /// Compile `name` unless cached; recursion is detected through `building`
    #[instrument(level = "debug", skip(self))]
    fn compile(&mut self, name: &str) -> Result<Arc<Program>> {
        if let Some(program) = self.cached(name) {
            return Ok(program);
        }
        let definition = self
            .definition(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownName(name.to_string()))?;

        if !self.building.insert(name.to_string()) {
            return Err(EngineError::RecursiveDefinition(name.to_string()));
        }
        let built = build_program(name, &definition.instructions, &mut LockedResolver { inner: self });
        self.building.remove(name);

        let program = Arc::new(built?);
        debug!(
            name,
            instructions = program.len(),
            max_level = program.max_expansion_level(),
            "compiled"
        );
        if let Some(entry) = self.tenants.get_mut(&definition.owner) {
            entry.compiled.insert(name.to_string(), Arc::clone(&program));
        }
        Ok(program)
    }

    /// Store a definition, dropping stale compiled entries that depend on it
    fn install(&mut self, definition: Definition) {
        self.invalidate(&definition.name);
        self.owners
            .insert(definition.name.clone(), definition.owner.clone());
        self.tenants
            .entry(definition.owner.clone())
            .or_default()
            .definitions
            .insert(definition.name.clone(), definition);
    }

    fn insert_compiled(&mut self, owner: &TenantId, name: &str, program: Arc<Program>) {
        self.tenants
            .entry(owner.clone())
            .or_default()
            .compiled
            .insert(name.to_string(), program);
    }

    /// Drop the compiled form of `name` and of everything that calls it
    fn invalidate(&mut self, name: &str) {
        let mut stale = vec![name.to_string()];
        stale.extend(self.dependents(name));
        for entry in self.tenants.values_mut() {
            for stale_name in &stale {
                entry.compiled.remove(stale_name);
            }
        }
    }

    /// Every entry whose call chain reaches `name`
    fn dependents(&self, name: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for entry in self.tenants.values() {
            for definition in entry.definitions.values() {
                if definition.name != name && self.chain(&definition.name).iter().any(|f| f == name) {
                    found.push(definition.name.clone());
                }
            }
        }
        found.sort();
        found
    }

    /// Transitive callees of `name` in discovery order
    fn chain(&self, name: &str) -> Vec<String> {
        let mut order = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![name];
        visited.insert(name);

        while let Some(current) = stack.pop() {
            let Some(definition) = self.definition(current) else {
                continue;
            };
            for call in definition.calls.iter().rev() {
                if visited.insert(call.as_str()) {
                    stack.push(call.as_str());
                }
            }
            if current != name {
                order.push(current.to_string());
            }
        }
        order
    }

    fn info(&self, definition: &Definition) -> EntryInfo {
        EntryInfo {
            name: definition.name.clone(),
            display_name: definition
                .display_name
                .clone()
                .unwrap_or_else(|| definition.name.clone()),
            owner: definition.owner.clone(),
            kind: definition.kind,
            arity: definition.arity,
            defined_in: definition.defined_in.clone(),
            instructions: definition.instructions.len(),
            max_level: self
                .cached(&definition.name)
                .map(|program| program.max_expansion_level()),
            average_cost: self.costs.get(&definition.name).map(RunningAverage::rounded),
        }
    }
}

/// Resolver over registry state the caller already holds exclusively
struct LockedResolver<'a> {
    inner: &'a mut RegistryInner,
}

impl FunctionResolver for LockedResolver<'_> {
    fn resolve(&mut self, name: &str) -> Result<Arc<Program>> {
        self.inner.compile(name)
    }

    fn arity(&mut self, name: &str) -> Result<usize> {
        self.inner.arity(name)
    }
}

/// Concurrent, multi-tenant namespace of functions and programs
#[derive(Debug, Default)]
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a function definition now and compile it on first lookup
    pub fn define_function(&self, tenant: &TenantId, document: &FunctionDocument) -> Result<()> {
        let mut inner = self.inner.write();
        inner.check_claim(tenant, &document.name, EntryKind::Function)?;
        inner.install(Definition::function(document, tenant, None));
        info!(%tenant, name = %document.name, "function defined");
        Ok(())
    }

    /// Compiled form of a function or program, shared
    pub fn resolve(&self, name: &str) -> Result<Arc<Program>> {
        let cached = self.inner.read().cached(name);
        if let Some(program) = cached {
            return Ok(program);
        }
        // compile() re-checks the cache: another writer may have won the race.
        self.inner.write().compile(name)
    }

    /// An independent copy of the compiled form of `name`
    pub fn lookup(&self, name: &str) -> Result<Program> {
        self.resolve(name).map(|program| program.as_ref().clone())
    }

    pub fn arity(&self, name: &str) -> Result<usize> {
        self.inner.read().arity(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().owners.contains_key(name)
    }

    pub fn owner(&self, name: &str) -> Option<TenantId> {
        self.inner.read().owners.get(name).cloned()
    }

    pub fn kind(&self, name: &str) -> Option<EntryKind> {
        self.inner.read().definition(name).map(|d| d.kind)
    }

    pub fn describe(&self, name: &str) -> Result<EntryInfo> {
        let inner = self.inner.read();
        inner
            .definition(name)
            .map(|definition| inner.info(definition))
            .ok_or_else(|| EngineError::UnknownName(name.to_string()))
    }

    /// Entries of one tenant, or of everyone, sorted by name
    pub fn entries(&self, tenant: Option<&TenantId>) -> Vec<EntryInfo> {
        let inner = self.inner.read();
        let mut entries: Vec<EntryInfo> = inner
            .tenants
            .iter()
            .filter(|(owner, _)| tenant.map_or(true, |t| t == *owner))
            .flat_map(|(_, entry)| entry.definitions.values())
            .map(|definition| inner.info(definition))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn names(&self, tenant: Option<&TenantId>, kind: EntryKind) -> Vec<String> {
        self.entries(tenant)
            .into_iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.name)
            .collect()
    }

    /// Every function reachable from `name` through calls, in discovery order
    pub fn all_functions_in_chain(&self, name: &str) -> Result<Vec<String>> {
        let inner = self.inner.read();
        if inner.definition(name).is_none() {
            return Err(EngineError::UnknownName(name.to_string()));
        }
        Ok(inner.chain(name))
    }

    /// Programs whose call chain reaches `function`, sorted by name
    pub fn programs_using(&self, function: &str) -> Result<Vec<String>> {
        let inner = self.inner.read();
        if inner.definition(function).is_none() {
            return Err(EngineError::UnknownName(function.to_string()));
        }
        Ok(inner
            .dependents(function)
            .into_iter()
            .filter(|name| matches!(inner.definition(name), Some(d) if d.kind == EntryKind::Program))
            .collect())
    }

    /// Fold one finished run into the average cost of `name`
    pub fn record_run(&self, name: &str, cycles: u64) {
        self.inner
            .write()
            .costs
            .entry(name.to_string())
            .or_default()
            .record(cycles);
    }

    /// Mean cycles per recorded run, rounded to one decimal
    pub fn average_cost(&self, name: &str) -> Option<f64> {
        self.inner.read().costs.get(name).map(RunningAverage::rounded)
    }

    pub fn run_count(&self, name: &str) -> u64 {
        self.inner.read().costs.get(name).map_or(0, |c| c.runs)
    }
}
