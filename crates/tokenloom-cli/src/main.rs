//! `tokenloom` command line.
//!
//! ```text
//! tokenloom build              # write every output
//! tokenloom check              # fail when an output is out of date
//! tokenloom watch [--poll]     # rebuild on source changes
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use console::style;
use tokenloom::{BuildError, BuildReport, Pipeline, WriteSummary, DEFAULT_FILE};

mod watch;

#[derive(Parser)]
#[command(name = "tokenloom")]
#[command(version)]
#[command(about = "Build design tokens into CSS, JS/TS, JSON and documentation")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_FILE)]
    config: PathBuf,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and write every output
    Build,

    /// Build in memory and fail if any output on disk is out of date
    Check,

    /// Build, then rebuild whenever a source changes
    Watch(WatchArgs),
}

#[derive(Args)]
struct WatchArgs {
    /// Poll the file system instead of using native events
    #[arg(long)]
    poll: bool,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 500)]
    poll_interval_ms: u64,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Command::Build => build(&cli.config),
        Command::Check => check(&cli.config),
        Command::Watch(args) => watch::run(
            &cli.config,
            args.poll,
            Duration::from_millis(args.poll_interval_ms),
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

pub(crate) fn load(config: &Path) -> Result<Pipeline> {
    Pipeline::from_file(config).with_context(|| format!("failed to load {}", config.display()))
}

pub(crate) fn build(config: &Path) -> Result<()> {
    let (report, summary) = load(config)?.run().context("build failed")?;
    print_summary(&report, &summary);
    Ok(())
}

fn check(config: &Path) -> Result<()> {
    let report = load(config)?.build().context("check failed")?;
    let stale: Vec<&Path> = report
        .artifacts
        .iter()
        .filter(|a| std::fs::read_to_string(&a.path).ok().as_deref() != Some(a.contents.as_str()))
        .map(|a| a.path.as_path())
        .collect();

    for path in &stale {
        eprintln!("{} {}", style("stale").yellow().bold(), path.display());
    }
    if !stale.is_empty() {
        anyhow::bail!("{} of {} outputs are out of date", stale.len(), report.artifacts.len());
    }
    eprintln!(
        "{} {} tokens, {} outputs up to date",
        style("ok").green().bold(),
        report.token_count,
        report.artifacts.len()
    );
    Ok(())
}

fn print_summary(report: &BuildReport, summary: &WriteSummary) {
    for path in &summary.written {
        eprintln!("{} {}", style("wrote").green(), path.display());
    }
    for path in &summary.unchanged {
        eprintln!("{} {}", style("unchanged").dim(), path.display());
    }

    let warnings = report.manifest.warning_count();
    let mut line = format!(
        "{} {} tokens, {} themes",
        style("built").green().bold(),
        report.token_count,
        report.themes.len()
    );
    if warnings > 0 {
        line.push_str(&format!(", {}", style(format!("{} warnings", warnings)).yellow()));
    }
    eprintln!("{}", line);
}

pub(crate) fn report_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", style("error:").red().bold(), err);
    if let Some(build) = err.downcast_ref::<BuildError>() {
        let paths = build.token_paths();
        if !paths.is_empty() {
            eprintln!("  {} {}", style("tokens:").bold(), paths.join(", "));
        }
    }
}
