//! shargs - declarative argument parsing for shell scripts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shargs::{
    effective_command_line, render_brief, render_error_file, render_exports, render_help_file,
    render_long, resolve, seed, write_output, HelpVariant, Outcome, ScriptSpec,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Declarative argument parsing for shell scripts.
#[derive(Parser, Debug)]
#[command(name = "shargs", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve script arguments and emit a sourceable output file
    Parse {
        /// Path of the target script
        #[arg(long)]
        script: PathBuf,

        /// Diagnostic verbosity; -vv reports the effective command line
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Arguments to resolve for the target script
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print help text for the target script
    Help {
        /// Path of the target script
        #[arg(long)]
        script: PathBuf,

        /// Render the full descriptions instead of the summary
        #[arg(long)]
        long: bool,
    },

    /// Dump the parsed specification as JSON for completion tooling
    DumpSpec {
        /// Path of the target script
        #[arg(long)]
        script: PathBuf,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("shargs: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            script,
            verbose,
            args,
        } => run_parse(&script, verbose, &args),
        Commands::Help { script, long } => run_help(&script, long),
        Commands::DumpSpec { script } => run_dump_spec(&script),
    }
}

fn run_parse(script: &Path, verbose: u8, args: &[String]) -> Result<ExitCode> {
    let spec = ScriptSpec::from_file(script).context("failed to load script specification")?;
    let env: HashMap<String, String> = std::env::vars().collect();

    match resolve(&spec, &env, args) {
        Ok(Outcome::Help(variant, resolution)) => {
            let text = match variant {
                HelpVariant::Brief => render_brief(&spec, &resolution),
                HelpVariant::Long => render_long(&spec, &resolution),
            };
            let path =
                write_output(&render_help_file(&text)).context("failed to write help output")?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Ok(Outcome::Done(resolution)) => {
            if verbose >= 2 {
                eprintln!("{}", effective_command_line(&spec, &resolution));
            }
            let path = write_output(&render_exports(&spec, &resolution))
                .context("failed to write output file")?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_user_error() => {
            // The sourced file is the delivery channel: it reports the
            // error on stderr once and exits 1.
            let seeded = seed(&spec, &env).unwrap_or_default();
            let brief = render_brief(&spec, &seeded);
            let path = write_output(&render_error_file(&err.to_string(), &brief))
                .context("failed to write error output")?;
            println!("{}", path.display());
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn run_help(script: &Path, long: bool) -> Result<ExitCode> {
    let spec = ScriptSpec::from_file(script).context("failed to load script specification")?;
    let env: HashMap<String, String> = std::env::vars().collect();
    let resolution = seed(&spec, &env).context("failed to resolve defaults")?;

    let text = if long {
        render_long(&spec, &resolution)
    } else {
        render_brief(&spec, &resolution)
    };
    print!("{text}");
    Ok(ExitCode::SUCCESS)
}

fn run_dump_spec(script: &Path) -> Result<ExitCode> {
    let spec = ScriptSpec::from_file(script).context("failed to load script specification")?;
    let json = serde_json::to_string_pretty(&spec.dump())
        .context("failed to encode specification")?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}
