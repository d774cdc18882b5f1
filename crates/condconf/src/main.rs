//! Command-line entry point for condconf.

mod report;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use condconf::config::{LayeredEnvironment, LayeredEnvironmentOptions, split_profiles};
use condconf::core::{Evaluator, resolve};
use condconf::{DocumentLoader, init_logging};
use log::{debug, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Command-line options for the condconf binary.
#[derive(Parser)]
#[command(name = "condconf", version)]
#[command(about = "Evaluate profile and property conditional configuration documents")]
struct Cli {
    /// Directory holding application.json5 and application-<profile>.json5
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,
    /// Activate a profile (repeatable; comma lists allowed)
    #[arg(short = 'p', long = "profile", global = true, value_name = "PROFILE")]
    profiles: Vec<String>,
    /// Runtime property override (repeatable)
    #[arg(
        short = 'D',
        long = "property",
        global = true,
        value_name = "KEY=VALUE",
        value_parser = parse_key_value
    )]
    properties: Vec<(String, String)>,
    /// Expose process environment variables as a property layer
    #[arg(long, global = true)]
    system_env: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a configuration document
    Eval {
        /// Path to the JSON5 document
        document: PathBuf,
        /// Stop at the first error
        #[arg(long)]
        fail_fast: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the resolved value of property keys
    Resolve {
        #[arg(required = true, value_name = "KEY")]
        keys: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging();

    let cli = Cli::parse();
    info!(
        "starting condconf (cwd_set={}, profiles={}, properties={}, system_env={})",
        cli.cwd.is_some(),
        cli.profiles.len(),
        cli.properties.len(),
        cli.system_env
    );
    let layered = load_environment(&cli)?;

    match cli.command {
        Command::Eval {
            document,
            fail_fast,
            format,
        } => {
            let loaded = DocumentLoader::new()
                .load_from_path(&document)
                .with_context(|| format!("failed to load document {}", document.display()))?;
            let evaluation = Evaluator::new(&layered.environment)
                .fail_fast(fail_fast)
                .run(&loaded)
                .context("evaluation stopped at the first error")?;
            let output = match format {
                OutputFormat::Text => report::render_text(&evaluation, &layered.environment),
                OutputFormat::Json => report::render_json(&evaluation, &layered.environment)
                    .context("failed to serialize evaluation")?,
            };
            println!("{output}");
            Ok(if evaluation.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Resolve { keys } => {
            let mut missing = 0usize;
            for key in &keys {
                match resolve(key, &layered.environment) {
                    Some(value) => println!("{key}={value}"),
                    None => {
                        missing += 1;
                        println!("{key} is not set");
                    }
                }
            }
            debug!("resolved keys (requested={}, missing={missing})", keys.len());
            Ok(if missing == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Build the layered environment from the global options.
fn load_environment(cli: &Cli) -> anyhow::Result<LayeredEnvironment> {
    let cwd = match &cli.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let mut options = LayeredEnvironmentOptions::new(&cwd);
    let profiles: Vec<String> = cli
        .profiles
        .iter()
        .flat_map(|value| split_profiles(value))
        .collect();
    if !profiles.is_empty() {
        options = options.with_active_profiles(profiles);
    }
    for (key, value) in &cli.properties {
        options = options.with_runtime_property(key, value);
    }
    if cli.system_env {
        options = options.with_process_env();
    }
    LayeredEnvironment::load_with_options(options)
        .with_context(|| format!("failed to load environment from {}", cwd.display()))
}

/// Parse a `key=value` runtime property.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{raw}'"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
