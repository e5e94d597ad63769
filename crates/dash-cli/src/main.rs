//! dashctl - offline dashboard conversion and checks
//!
//! ```text
//! dashctl convert legacy.json -o spec.json
//! dashctl validate spec.json
//! dashctl roundtrip resource.json
//! ```

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dash_loader::LoaderConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "dashctl", version, about = "Convert, validate and round-trip dashboard documents")]
struct Cli {
    /// Loader configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a v1 document or bare v1 dashboard to a canonical v2 spec
    Convert {
        input: PathBuf,
        /// Write the spec here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Freeze variables as in a snapshot
        #[arg(long)]
        snapshot: bool,
    },
    /// Check a v2 spec or resource against the structural validator
    Validate { input: PathBuf },
    /// Check that a document survives document -> scene -> document
    Roundtrip { input: PathBuf },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let config = match &cli.config {
        Some(path) => LoaderConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LoaderConfig::default(),
    };
    let options = config.transform_options();

    match cli.command {
        Command::Convert {
            input,
            output,
            snapshot,
        } => {
            let spec = commands::convert(commands::read_json(&input)?, &options.with_snapshot(snapshot))?;
            let text = serde_json::to_string_pretty(&spec)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!(path = %path.display(), "spec written");
                }
                None => println!("{text}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { input } => match commands::validate(&commands::read_json(&input)?) {
            Ok(()) => {
                println!("valid");
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                for violation in &err.violations {
                    println!("{violation}");
                }
                tracing::warn!(violations = err.violations.len(), "spec is invalid");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Roundtrip { input } => {
            let report = commands::roundtrip(commands::read_json(&input)?, &options)?;
            if report.differences.is_empty() {
                println!("identical");
                return Ok(ExitCode::SUCCESS);
            }
            println!("differs at {} path(s)", report.differences.len());
            for path in &report.differences {
                println!("  {path}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
