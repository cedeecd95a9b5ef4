// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! autometer main entry point: instrument Go functions and inspect runtime config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use autometer::config;
use autometer::generate::{Generator, GeneratorOptions};
use autometer::slo::AlertConfiguration;
use autometer::telemetry::{init_logging, LogConfig};

/// Function-level metrics for Go code.
#[derive(Parser)]
#[command(name = "autometer")]
#[command(author, version, about = "Instrument Go functions with autometrics", long_about = None)]
struct Cli {
    /// Show debug output on stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Show trace output on stderr
    #[arg(long, global = true)]
    trace: bool,

    /// Log filter directive, e.g. `autometer::runtime=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_filter: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for autometer.
#[derive(Subcommand)]
enum Commands {
    /// Add or refresh the instrumentation of a function; prints the new source
    Instrument {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        options: InstrumentArgs,
    },

    /// Remove the instrumentation of a function; prints the new source
    Remove {
        #[command(flatten)]
        target: Target,
    },

    /// Show the effective runtime configuration
    Config {
        /// Workspace to read configuration from (defaults to the nearest
        /// directory with a config file, then the current directory)
        #[arg(long)]
        workspace: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct Target {
    /// Go source file
    #[arg(short, long)]
    file: PathBuf,

    /// Function name, or `Receiver.Method` for methods
    #[arg(short = 'n', long)]
    function: String,
}

#[derive(Args)]
struct InstrumentArgs {
    /// Name of the SLO the function contributes to
    #[arg(long)]
    slo_name: Option<String>,

    /// Latency threshold in milliseconds
    #[arg(long, requires_all = ["slo_name", "latency_target"])]
    latency_ms: Option<u64>,

    /// Percentage of calls that must finish within --latency-ms
    #[arg(long, requires_all = ["slo_name", "latency_ms"])]
    latency_target: Option<f64>,

    /// Percentage of calls that must succeed
    #[arg(long, requires = "slo_name")]
    success_target: Option<f64>,

    /// Do not track concurrent calls
    #[arg(long)]
    no_concurrent_calls: bool,

    /// Do not track the caller name
    #[arg(long)]
    no_caller_name: bool,

    /// Name the runtime package is imported under (defaults to the file's import)
    #[arg(long)]
    impl_import: Option<String>,
}

impl InstrumentArgs {
    fn alert(&self) -> anyhow::Result<Option<AlertConfiguration>> {
        let Some(name) = &self.slo_name else {
            return Ok(None);
        };

        let mut alert = AlertConfiguration::new(name.as_str());
        if let (Some(ms), Some(target)) = (self.latency_ms, self.latency_target) {
            alert = alert.with_latency(Duration::from_millis(ms), target);
        }
        if let Some(target) = self.success_target {
            alert = alert.with_success(target);
        }
        alert.validate()?;
        Ok(Some(alert))
    }

    fn to_options(&self) -> anyhow::Result<GeneratorOptions> {
        Ok(GeneratorOptions {
            track_concurrent_calls: !self.no_concurrent_calls,
            track_caller_name: !self.no_caller_name,
            alert: self.alert()?,
            impl_import_name: self.impl_import.clone(),
        })
    }
}

fn main() {
    let cli = Cli::parse();

    let mut log_config = if cli.trace {
        LogConfig::verbose().with_level(Level::TRACE)
    } else if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    if let Some(filter) = &cli.log_filter {
        log_config = log_config.with_filter(filter.as_str());
    }
    if cli.no_color {
        colored::control::set_override(false);
        log_config = log_config.with_ansi(false);
    }
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{} {}", "warning:".yellow(), e);
    }

    if let Err(e) = run(cli.command) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Instrument { target, options } => {
            let options = options.to_options()?;
            let source = read_source(&target.file)?;
            let mut generator = Generator::new()?;
            let output = generator
                .instrument(&source, &target.function, &options)
                .with_context(|| format!("instrumenting {}", target.file.display()))?;
            print!("{}", output);
        }
        Commands::Remove { target } => {
            let source = read_source(&target.file)?;
            let mut generator = Generator::new()?;
            let output = generator
                .remove(&source, &target.function)
                .with_context(|| format!("removing instrumentation in {}", target.file.display()))?;
            print!("{}", output);
        }
        Commands::Config { workspace } => {
            let root = match workspace {
                Some(root) => root,
                None => {
                    let cwd = std::env::current_dir()?;
                    config::find_workspace_root(&cwd).unwrap_or(cwd)
                }
            };
            let resolved = config::load_config(&root)
                .with_context(|| format!("loading configuration for {}", root.display()))?;

            println!("{} {}", "workspace:".bold(), root.display());
            match &resolved.push_endpoint {
                Some(endpoint) => println!("{} {}", "push:".bright_cyan(), endpoint.job_url()),
                None => println!("{}", "push: disabled".bright_black()),
            }
            println!("{} {:?}", "timeout:".bold(), resolved.push_timeout);
            println!("{} {:?}", "buckets:".bold(), resolved.buckets.bounds());
            println!("{} {}", "build:".bold(), serde_json::to_string(&resolved.build)?);
        }
        Commands::Version => {
            println!("autometer {}", autometer::VERSION);
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if !path.is_file() {
        bail!("not a file: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
