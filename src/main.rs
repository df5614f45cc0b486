mod commands;
mod config;
mod diagnostics;
mod error;
mod index;
mod info;
mod reference;
mod resolver;
mod scanner;
mod types;
mod watch;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{CheckOptions, EXIT_RUNTIME_ERROR, Project};

#[derive(Parser)]
#[command(name = "vtkref", version, about = "Resolve :vtk: references into VTK documentation links")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Config file to use instead of `.vtkref.toml` in the current directory
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Anchor index file, overriding the configured one
    #[arg(long, global = true, value_name = "FILE")]
    index: Option<PathBuf>,
    /// Log internal progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every :vtk: role in the documentation and report unresolved ones
    Check {
        /// Worker threads for resolution (0 = one per core)
        #[arg(long, short, default_value_t = 0)]
        jobs: usize,
        /// Print links and totals as JSON
        #[arg(long)]
        json: bool,
        /// Treat unresolved references as errors
        #[arg(long, short = 'W')]
        strict: bool,
    },
    /// Show syntax, configuration, and current state
    Info {
        /// Output as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// List the member anchors the index knows for a class
    Members {
        /// Class name, e.g. vtkImageData
        class: String,
    },
    /// Resolve a single role target
    Resolve {
        /// Print the link as JSON
        #[arg(long)]
        json: bool,
        /// Treat an unresolved reference as an error
        #[arg(long, short = 'W')]
        strict: bool,
        /// Role target, e.g. `~vtkImageData.GetSpacing`
        target: String,
    },
    /// Run check, then re-run whenever documentation or the index changes
    Watch {
        /// Worker threads for resolution (0 = one per core)
        #[arg(long, short, default_value_t = 0)]
        jobs: usize,
        /// Print links and totals as JSON
        #[arg(long)]
        json: bool,
        /// Treat unresolved references as errors
        #[arg(long, short = 'W')]
        strict: bool,
    },
}

/// Route logs to stderr. `VTKREF_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "vtkref=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("VTKREF_LOG").unwrap_or_else(|_err| return EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project = match Project::load(Path::new("."), cli.config.as_deref(), cli.index.as_deref()) {
        Ok(project) => project,
        Err(e) => {
            diagnostics::print_error(&e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        },
    };
    let strict_default = project.config.strict;

    let result = match cli.command {
        Commands::Check { jobs, json, strict } => {
            let options = CheckOptions { jobs, json, strict: strict || strict_default };
            commands::check(&project, options)
        },
        Commands::Info { json } => {
            info::run(&project, json);
            Ok(ExitCode::SUCCESS)
        },
        Commands::Members { class } => commands::members(&project, &class),
        Commands::Resolve { json, strict, target } => {
            commands::resolve(&project, &target, json, strict || strict_default)
        },
        Commands::Watch { jobs, json, strict } => {
            let options = CheckOptions { jobs, json, strict: strict || strict_default };
            watch::run(&project, options)
        },
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        },
    };
}
