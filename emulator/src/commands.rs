//! Sub-command implementations

use crate::render;
use crate::repl;
use anyhow::{bail, Context, Result};
use front_end::document::ProgramDocument;
use middle_end::instruction::Architecture;
use middle_end::registry::{EntryKind, Registry};
use middle_end::ProgramContext;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Read a program document and make it the context's active program
pub fn load(ctx: &mut ProgramContext, path: &Path) -> Result<()> {
    let document = ProgramDocument::from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let report = ctx.load(&document)?;
    info!(
        program = ?report.program,
        functions = report.functions.len(),
        path = %path.display(),
        "document registered"
    );
    Ok(())
}

/// A fresh context over an empty registry with `path` loaded
pub fn open(tenant: &str, path: &Path) -> Result<ProgramContext> {
    let mut ctx = ProgramContext::new(Arc::new(Registry::new()), tenant);
    load(&mut ctx, path)?;
    Ok(ctx)
}

pub fn show(ctx: &mut ProgramContext, level: usize, expand: &[String]) -> Result<()> {
    if expand.is_empty() {
        let program = ctx.expand(level)?;
        println!("{}", render::listing(&program, level, ctx.max_level()?));
        return Ok(());
    }

    for text in expand {
        let index = repl::instruction_index(text).map_err(anyhow::Error::msg)?;
        if !ctx.expand_at(index)? {
            warn!(instruction = index + 1, "already primitive, nothing to expand");
        }
    }
    if let Some(view) = ctx.view() {
        println!("{}", render::view(view));
    }
    Ok(())
}

pub fn info(ctx: &ProgramContext, level: usize, json: bool) -> Result<()> {
    let program = ctx.expand(level)?;
    let max_level = ctx.max_level()?;
    let entries = ctx.registry().entries(Some(ctx.tenant()));

    if json {
        let functions: Vec<_> = entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Function)
            .collect();
        let value = serde_json::json!({
            "program": program.name(),
            "level": level.min(max_level),
            "max_level": max_level,
            "summary": program.summary(),
            "runs_on": Architecture::ALL
                .into_iter()
                .filter(|a| program.can_run_on(*a))
                .collect::<Vec<_>>(),
            "inputs": program.inputs().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "labels": program.sorted_labels().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "variables": program.variables().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "functions": functions,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", render::summary(&program, level, max_level));
        println!("{}", render::functions(&entries));
    }
    Ok(())
}

pub fn run(ctx: &mut ProgramContext, input: &[u64], level: usize, budget: Option<u64>, json: bool) -> Result<()> {
    let result = match budget {
        Some(budget) => ctx.execute_with_budget(input, level, budget)?,
        None => ctx.execute(input, level)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("{}", render::outcome(&result));
    if let Some(name) = ctx.active_name() {
        if let Some(average) = ctx.registry().average_cost(name) {
            println!("average cost: {:.1} cycles", average);
        }
    }
    Ok(())
}

pub fn debug(ctx: &mut ProgramContext, input: &[u64], level: usize, breakpoints: &[String]) -> Result<()> {
    let indices = breakpoints
        .iter()
        .map(|text| repl::instruction_index(text).map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;
    let first = ctx.start_debug(input, level, indices)?;
    repl::run(ctx, &first)
}

/// Dependency report for one registered name
pub fn deps(ctx: &ProgramContext, name: &str) -> Result<()> {
    let registry = ctx.registry();
    let Some(kind) = registry.kind(name) else {
        bail!("`{}` is not defined in this document", name);
    };

    let chain = registry.all_functions_in_chain(name)?;
    println!("{} `{}` calls:", kind.describe(), name);
    if chain.is_empty() {
        println!("  nothing");
    }
    for function in &chain {
        println!("  {}/{}", function, registry.arity(function)?);
    }

    if kind == EntryKind::Function {
        let users = registry.programs_using(name)?;
        println!("used by programs: {}", if users.is_empty() { "none".to_string() } else { users.join(", ") });
    }
    Ok(())
}
