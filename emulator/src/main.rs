//! Register-machine emulator
//!
//! Loads a JSON program document, then lists, inspects, runs or debugs the
//! program at any expansion level.

mod commands;
mod render;
mod repl;

#[cfg(test)]
mod tests;

use clap::{Parser, Subcommand};
use colored::Colorize;
use front_end::diagnostics_reporter::DiagnosticReporter;
use middle_end::EngineError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "emulator")]
#[command(about = "Run and debug register-machine programs")]
struct Cli {
    /// Tenant that owns the names registered by the loaded document
    #[arg(long, global = true, default_value = "local")]
    tenant: String,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the program listing with provenance
    Show {
        file: PathBuf,
        #[arg(long, default_value = "0")]
        level: usize,
        /// Expand only instruction #N of the listing as it stands; may be repeated
        #[arg(long = "expand", conflicts_with = "level")]
        expand: Vec<String>,
    },
    /// Print instruction counts, architecture, labels and variables
    Info {
        file: PathBuf,
        #[arg(long, default_value = "0")]
        level: usize,
        #[arg(long)]
        json: bool,
    },
    /// Run the program to completion
    Run {
        file: PathBuf,
        /// Comma-separated natural numbers bound to x1, x2, ...
        #[arg(long, value_delimiter = ',')]
        input: Vec<u64>,
        #[arg(long, default_value = "0")]
        level: usize,
        /// Give up once this many cycles have been spent
        #[arg(long)]
        budget: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Step through the program interactively
    Debug {
        file: PathBuf,
        #[arg(long, value_delimiter = ',')]
        input: Vec<u64>,
        #[arg(long, default_value = "0")]
        level: usize,
        /// Pause before instruction #N; may be repeated
        #[arg(long = "break")]
        breakpoints: Vec<String>,
    },
    /// List the functions a name calls and the programs that use it
    Deps { file: PathBuf, name: String },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("emulator={level},middle_end={level},front_end={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Show { file, level, expand } => {
            let mut ctx = commands::open(&cli.tenant, &file)?;
            commands::show(&mut ctx, level, &expand)
        }
        Command::Info { file, level, json } => {
            let ctx = commands::open(&cli.tenant, &file)?;
            commands::info(&ctx, level, json)
        }
        Command::Run {
            file,
            input,
            level,
            budget,
            json,
        } => {
            let mut ctx = commands::open(&cli.tenant, &file)?;
            commands::run(&mut ctx, &input, level, budget, json)
        }
        Command::Debug {
            file,
            input,
            level,
            breakpoints,
        } => {
            let mut ctx = commands::open(&cli.tenant, &file)?;
            commands::debug(&mut ctx, &input, level, &breakpoints)
        }
        Command::Deps { file, name } => {
            let ctx = commands::open(&cli.tenant, &file)?;
            commands::deps(&ctx, &name)
        }
    }
}

/// Print an error, with a source snippet when an argument expression is at fault
fn report(err: &anyhow::Error) {
    if let Some(EngineError::ArgumentSyntax {
        function,
        expression,
        source,
    }) = err.downcast_ref::<EngineError>()
    {
        eprintln!("{}", DiagnosticReporter::new(expression).report_error(source));
        eprintln!("  in the arguments of `{}`", function);
        return;
    }
    eprintln!("{} {:#}", "error:".red().bold(), err);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}
