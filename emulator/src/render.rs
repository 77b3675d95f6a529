//! Text views of programs, runs and debug sessions

use colored::Colorize;
use middle_end::debugger::DebugSession;
use middle_end::instruction::Architecture;
use middle_end::interpreter::{HaltReason, RunResult};
use middle_end::registry::{EntryInfo, EntryKind};
use middle_end::Program;
use std::fmt::Write;

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Full listing with a header naming the level
pub fn listing(program: &Program, level: usize, max_level: usize) -> String {
    format!(
        "{}\n{}",
        format!("level {} of {}", level.min(max_level), max_level).dimmed(),
        program
    )
}

/// Listing of a selectively expanded program
pub fn view(program: &Program) -> String {
    format!(
        "{}\n{}",
        format!("selectively expanded, max level {}", program.max_expansion_level()).dimmed(),
        program
    )
}

/// Counts, architecture and names of a program at one level
pub fn summary(program: &Program, level: usize, max_level: usize) -> String {
    let summary = program.summary();
    let mut out = String::new();

    let _ = writeln!(out, "Program: {} (level {} of {})", program.name(), level.min(max_level), max_level);
    let _ = writeln!(
        out,
        "Instructions: {} ({} basic, {} synthetic)",
        summary.total, summary.basic, summary.synthetic
    );
    let _ = writeln!(out, "Architecture: {}", summary.minimum_architecture);
    for (architecture, count) in &summary.per_architecture {
        let _ = writeln!(out, "  {:<4} {}", architecture.to_string(), count);
    }
    let runs_on = Architecture::ALL
        .into_iter()
        .filter(|a| program.can_run_on(*a));
    let _ = writeln!(out, "Runs on: {}", join(runs_on));
    let _ = writeln!(out, "Inputs: {}", join(program.inputs()));
    let _ = writeln!(out, "Labels: {}", join(program.sorted_labels()));
    let _ = write!(out, "Variables: {}", join(program.variables()));
    out
}

/// Registered functions, one per line
pub fn functions(entries: &[EntryInfo]) -> String {
    let lines: Vec<String> = entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::Function)
        .map(|entry| {
            let mut line = format!("  {}/{}", entry.name, entry.arity);
            if entry.display_name != entry.name {
                let _ = write!(line, " \"{}\"", entry.display_name);
            }
            if let Some(cost) = entry.average_cost {
                let _ = write!(line, " avg {:.1} cycles", cost);
            }
            line
        })
        .collect();
    if lines.is_empty() {
        "Functions: none".to_string()
    } else {
        format!("Functions:\n{}", lines.join("\n"))
    }
}

/// Outcome of a run, with the halt reason highlighted
pub fn outcome(result: &RunResult) -> String {
    let text = result.to_string();
    match result.halt_reason {
        Some(HaltReason::Finished) | None => text,
        Some(_) => text.yellow().to_string(),
    }
}

/// Where a live session stands: the next instruction and every variable
pub fn paused(session: &DebugSession, result: &RunResult) -> String {
    let mut out = String::new();
    if let Some(pointer) = result.debug_pointer {
        let marker = if session.breakpoints().contains(&pointer) {
            "breakpoint".red().bold()
        } else {
            "paused".yellow().bold()
        };
        let line = session.program().render_line(pointer).unwrap_or_default();
        let _ = writeln!(out, "{} {}", marker, line);
    }
    let _ = write!(out, "{}", result);
    out
}

/// Breakpoints as the one-based numbers used in listings
pub fn breakpoints(session: &DebugSession) -> String {
    if session.breakpoints().is_empty() {
        return "no breakpoints".to_string();
    }
    format!(
        "breakpoints: {}",
        join(session.breakpoints().iter().map(|index| format!("#{}", index + 1)))
    )
}
