//! Program container
//!
//! An ordered instruction list plus everything derived from it. The
//! derived data is rebuilt by [`Program::unpack`] whenever the list
//! changes, so readers never see a stale label table.

use crate::error::{EngineError, Result};
use crate::instruction::{Architecture, Instruction, Label, OriginId, Variable};
use crate::lowering::ExpansionContext;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

/// An ancestor instruction together with its position in the program it lived in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageEntry {
    pub position: usize,
    pub instruction: Instruction,
}

/// Instruction counts of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramSummary {
    pub total: usize,
    pub basic: usize,
    pub synthetic: usize,
    pub per_architecture: BTreeMap<Architecture, usize>,
    pub minimum_architecture: Architecture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    name: String,
    instructions: Vec<Instruction>,
    /// Arena the instructions' `origin` indices point into
    lineage: Vec<LineageEntry>,

    // derived by unpack()
    variables: BTreeSet<Variable>,
    inputs: Vec<Variable>,
    label_table: HashMap<Label, usize>,
    labels: Vec<Label>,
    max_level: usize,
}

impl Program {
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self::with_lineage(name.into(), instructions, Vec::new())
    }

    fn with_lineage(name: String, instructions: Vec<Instruction>, lineage: Vec<LineageEntry>) -> Self {
        let mut program = Self {
            name,
            instructions,
            lineage,
            variables: BTreeSet::new(),
            inputs: Vec::new(),
            label_table: HashMap::new(),
            labels: Vec::new(),
            max_level: 0,
        };
        program.unpack();
        program
    }

    /// Build and check that every jump target exists
    pub fn checked(name: impl Into<String>, instructions: Vec<Instruction>) -> Result<Self> {
        let program = Self::new(name, instructions);
        program.verify_legal()?;
        Ok(program)
    }

    /// Rebuild every derived field from the instruction list
    pub fn unpack(&mut self) {
        self.variables.clear();
        self.inputs.clear();
        self.label_table.clear();
        self.labels.clear();

        self.variables.insert(Variable::Output);
        for (index, instruction) in self.instructions.iter().enumerate() {
            for variable in instruction.present_variables() {
                if self.variables.insert(variable) && variable.input_index().is_some() {
                    self.inputs.push(variable);
                }
            }
            if !instruction.label.is_none() {
                // first occurrence of a duplicate label wins
                self.label_table.entry(instruction.label).or_insert(index);
                if !self.labels.contains(&instruction.label) {
                    self.labels.push(instruction.label);
                }
            }
        }

        let exits = self
            .instructions
            .iter()
            .any(|i| i.target_label() == Label::Exit);
        if exits && !self.labels.contains(&Label::Exit) {
            self.labels.push(Label::Exit);
        }

        self.max_level = self
            .instructions
            .iter()
            .map(Instruction::depth)
            .max()
            .unwrap_or(0);
    }

    /// Every non-sentinel jump target must be defined
    pub fn verify_legal(&self) -> Result<()> {
        for instruction in &self.instructions {
            let target = instruction.target_label();
            if matches!(target, Label::Numbered(_)) && !self.label_table.contains_key(&target) {
                return Err(EngineError::UndefinedLabel {
                    program: self.name.clone(),
                    label: target,
                });
            }
        }
        Ok(())
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
        self.unpack();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Referenced variables, `y` included, in letter-then-number order
    pub fn variables(&self) -> &BTreeSet<Variable> {
        &self.variables
    }

    /// Input variables in the order they first appear
    pub fn inputs(&self) -> &[Variable] {
        &self.inputs
    }

    /// Defined labels in order of appearance, then `EXIT` if anything jumps there
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn sorted_labels(&self) -> Vec<Label> {
        let mut labels = self.labels.clone();
        labels.sort();
        labels
    }

    pub fn label_index(&self, label: Label) -> Option<usize> {
        self.label_table.get(&label).copied()
    }

    /// Where a jump to `label` lands; `EXIT` and unknown labels end the run
    pub fn jump_destination(&self, label: Label) -> usize {
        match label {
            Label::Exit | Label::None => self.len(),
            Label::Numbered(_) => self.label_index(label).unwrap_or(self.len()),
        }
    }

    /// Highest input index referenced
    pub fn arity(&self) -> usize {
        self.variables
            .iter()
            .filter_map(Variable::input_index)
            .max()
            .unwrap_or(0) as usize
    }

    pub fn max_expansion_level(&self) -> usize {
        self.max_level
    }

    /// Distinct names of every function called, nested argument calls included
    pub fn called_functions(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for name in self.instructions.iter().flat_map(Instruction::called_functions) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    pub fn minimum_architecture(&self) -> Architecture {
        self.instructions
            .iter()
            .map(Instruction::architecture)
            .max()
            .unwrap_or(Architecture::I)
    }

    pub fn can_run_on(&self, architecture: Architecture) -> bool {
        self.minimum_architecture() <= architecture
    }

    pub fn summary(&self) -> ProgramSummary {
        let mut per_architecture: BTreeMap<Architecture, usize> =
            Architecture::ALL.iter().map(|a| (*a, 0)).collect();
        for instruction in &self.instructions {
            *per_architecture.entry(instruction.architecture()).or_default() += 1;
        }
        let basic = per_architecture[&Architecture::I];

        ProgramSummary {
            total: self.len(),
            basic,
            synthetic: self.len() - basic,
            per_architecture,
            minimum_architecture: self.minimum_architecture(),
        }
    }

    /// Ancestors of `instruction`, nearest first
    pub fn provenance(&self, instruction: &Instruction) -> Vec<&LineageEntry> {
        let mut chain = Vec::new();
        let mut next = instruction.origin;
        while let Some(OriginId(index)) = next {
            match self.lineage.get(index) {
                Some(entry) => {
                    chain.push(entry);
                    next = entry.instruction.origin;
                }
                None => break,
            }
        }
        chain
    }

    /// Lower the whole program `level` times, stopping early once it is all primitive
    pub fn expand(&self, level: usize) -> Program {
        let mut current = self.clone();
        for pass in 0..level {
            if current.max_expansion_level() == 0 {
                break;
            }
            current = current.expand_once();
            debug!(
                program = %self.name,
                pass = pass + 1,
                instructions = current.len(),
                remaining = current.max_expansion_level(),
                "expansion pass complete"
            );
        }
        current
    }

    fn expand_once(&self) -> Program {
        let mut ctx = ExpansionContext::seeded_from(&self.instructions);
        let mut lineage = self.lineage.clone();
        let mut expanded = Vec::with_capacity(self.instructions.len());

        for (position, instruction) in self.instructions.iter().enumerate() {
            if instruction.depth() == 0 {
                expanded.push(instruction.clone());
                continue;
            }
            let origin = OriginId(lineage.len());
            lineage.push(LineageEntry {
                position: position + 1,
                instruction: instruction.clone(),
            });
            expanded.extend(instruction.expand(&mut ctx, origin));
        }

        Self::with_lineage(self.name.clone(), expanded, lineage)
    }

    /// Replace the instruction at `index` with its one-level expansion
    ///
    /// Returns `false` for a primitive instruction, which has nothing to expand.
    pub fn expand_at(&mut self, index: usize) -> Result<bool> {
        let instruction = self.checked_index(index)?.clone();
        if instruction.depth() == 0 {
            return Ok(false);
        }
        let mut ctx = ExpansionContext::seeded_from(&self.instructions);
        let origin = OriginId(self.lineage.len());
        self.lineage.push(LineageEntry {
            position: index + 1,
            instruction: instruction.clone(),
        });
        let children = instruction.expand(&mut ctx, origin);
        debug!(program = %self.name, index, children = children.len(), "instruction expanded");

        self.instructions.splice(index..=index, children);
        self.unpack();
        Ok(true)
    }

    /// Fold the expansion that produced the instruction at `index` back into its parent
    ///
    /// Everything descended from that parent goes, nested expansions included.
    /// Returns `false` when the instruction did not come from an expansion.
    pub fn collapse_at(&mut self, index: usize) -> Result<bool> {
        let Some(origin) = self.checked_index(index)?.origin else {
            return Ok(false);
        };
        let Some(parent) = self.lineage.get(origin.0).map(|entry| entry.instruction.clone()) else {
            return Ok(false);
        };

        // descendants of one parent are always contiguous
        let mut start = index;
        while start > 0 && self.descends_from(&self.instructions[start - 1], origin) {
            start -= 1;
        }
        let mut end = index + 1;
        while end < self.len() && self.descends_from(&self.instructions[end], origin) {
            end += 1;
        }
        debug!(program = %self.name, start, end, "expansion collapsed");

        self.instructions.splice(start..end, [parent]);
        self.unpack();
        Ok(true)
    }

    fn checked_index(&self, index: usize) -> Result<&Instruction> {
        self.instructions
            .get(index)
            .ok_or(EngineError::InstructionOutOfRange {
                index,
                len: self.len(),
            })
    }

    fn descends_from(&self, instruction: &Instruction, ancestor: OriginId) -> bool {
        let mut next = instruction.origin;
        while let Some(id) = next {
            if id == ancestor {
                return true;
            }
            next = self.lineage.get(id.0).and_then(|entry| entry.instruction.origin);
        }
        false
    }

    /// One listing line with the full provenance chain
    pub fn render_line(&self, index: usize) -> Option<String> {
        let instruction = self.instructions.get(index)?;
        let mut line = instruction.render(index + 1);
        for ancestor in self.provenance(instruction) {
            line.push_str(" <<< ");
            line.push_str(&ancestor.instruction.render(ancestor.position));
        }
        Some(line)
    }
}

fn join<T: fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Program: {}", self.name)?;
        writeln!(f, "Inputs: {}", join(self.inputs.iter()))?;
        writeln!(f, "Labels: {}", join(self.sorted_labels()))?;
        for index in 0..self.len() {
            if let Some(line) = self.render_line(index) {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}
