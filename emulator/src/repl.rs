//! Interactive debugger loop

use crate::render;
use anyhow::Result;
use colored::Colorize;
use middle_end::interpreter::RunResult;
use middle_end::{EngineError, ProgramContext};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::str::FromStr;
use tracing::debug;

const HELP: &str = "\
commands:
  step, s        execute one instruction
  back, b        undo the last step
  continue, c    run to the next breakpoint or the end
  stop           end the session
  break N        add a breakpoint before instruction #N
  clear N        remove the breakpoint before instruction #N
  state          show where the session stands
  help           show this text
  quit, q        stop the session and leave";

/// One line typed at the debug prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step,
    Back,
    Continue,
    Stop,
    /// Zero-based index of the instruction listed as `#N`
    Break(usize),
    Clear(usize),
    State,
    Help,
    Quit,
}

/// Convert a listing number (`#1` is the first instruction) to an index
pub fn instruction_index(text: &str) -> Result<usize, String> {
    let text = text.trim().trim_start_matches('#');
    match text.parse::<usize>() {
        Ok(0) => Err("instruction numbers start at 1".to_string()),
        Ok(number) => Ok(number - 1),
        Err(_) => Err(format!("`{}` is not an instruction number", text)),
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let head = words.next().unwrap_or("").to_ascii_lowercase();
        let argument = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments to `{}`", head));
        }

        let needs_number = |name: &str| -> Result<usize, String> {
            let text = argument.ok_or_else(|| format!("`{}` needs an instruction number", name))?;
            instruction_index(text)
        };

        match head.as_str() {
            "step" | "s" => Ok(Command::Step),
            "back" | "b" => Ok(Command::Back),
            "continue" | "c" => Ok(Command::Continue),
            "stop" => Ok(Command::Stop),
            "break" => needs_number("break").map(Command::Break),
            "clear" => needs_number("clear").map(Command::Clear),
            "state" => Ok(Command::State),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command `{}`; try `help`", other)),
        }
    }
}

/// What the loop should do after a command
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Show(String),
    Done(String),
}

/// Apply one command to the context's live session
pub fn apply(ctx: &mut ProgramContext, command: Command) -> std::result::Result<Reply, EngineError> {
    let moved = |ctx: &ProgramContext, result: RunResult| match ctx.debug_session() {
        Some(session) => Reply::Show(render::paused(session, &result)),
        None => Reply::Done(render::outcome(&result)),
    };

    match command {
        Command::Step => {
            let result = ctx.step_over()?;
            Ok(moved(ctx, result))
        }
        Command::Back => {
            let result = ctx.step_back()?;
            Ok(moved(ctx, result))
        }
        Command::Continue => {
            let result = ctx.resume()?;
            Ok(moved(ctx, result))
        }
        Command::Stop | Command::Quit => {
            let result = ctx.stop_debug()?;
            Ok(Reply::Done(render::outcome(&result)))
        }
        Command::Break(index) => {
            ctx.set_breakpoint(index)?;
            let session = ctx.debug_session().ok_or(EngineError::NoActiveSession)?;
            Ok(Reply::Show(render::breakpoints(session)))
        }
        Command::Clear(index) => {
            let removed = ctx.remove_breakpoint(index)?;
            let session = ctx.debug_session().ok_or(EngineError::NoActiveSession)?;
            let text = if removed {
                render::breakpoints(session)
            } else {
                format!("no breakpoint at #{}", index + 1)
            };
            Ok(Reply::Show(text))
        }
        Command::State => {
            let session = ctx.debug_session().ok_or(EngineError::NoActiveSession)?;
            Ok(Reply::Show(format!(
                "{}\n{}",
                render::paused(session, &session.snapshot()),
                render::breakpoints(session)
            )))
        }
        Command::Help => Ok(Reply::Show(HELP.to_string())),
    }
}

/// Drive the context's debug session from the terminal until it ends
pub fn run(ctx: &mut ProgramContext, first: &RunResult) -> Result<()> {
    match ctx.debug_session() {
        Some(session) => println!("{}", render::paused(session, first)),
        None => {
            println!("{}", render::outcome(first));
            return Ok(());
        }
    }
    println!("{}", "type `help` for commands".dimmed());

    let mut rl = DefaultEditor::new()?;
    while ctx.is_debugging() {
        let line = match rl.readline("debug> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                apply(ctx, Command::Quit)?;
                break;
            }
            Err(err) => return Err(err.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{} {}", "error:".red().bold(), message);
                continue;
            }
        };
        debug!(?command, "debug command");

        match apply(ctx, command) {
            Ok(Reply::Show(text)) => println!("{}", text),
            Ok(Reply::Done(text)) => {
                println!("{}", text);
                break;
            }
            Err(err) if err.is_usage_error() => eprintln!("{} {}", "error:".red().bold(), err),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
