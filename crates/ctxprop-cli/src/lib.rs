//! Command-line front end for ctxprop
//!
//! Argument parsing, configuration overrides and the terminal prompt live here
//! so they can be tested without spawning the binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use ctxprop_core::{DecisionMode, FileTracer, InteractiveDecider, PropagateConfig, TracerSummary};

pub mod prompt;

pub use prompt::TerminalReader;

/// Argument definitions for the `ctxprop` binary
pub fn command() -> Command {
    Command::new("ctxprop")
        .version(ctxprop_core::VERSION)
        .about("Reuse the enclosing context.Context instead of constructing fresh ones at call sites")
        .arg(
            Arg::new("directory")
                .value_name("DIRECTORY")
                .help("Directory of the Go package to rewrite")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .short('i')
                .help("Ask before every rewrite and for names of discarded contexts")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Report what would change without writing any file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-format")
                .long("no-format")
                .help("Do not run the formatter afterwards")
                .action(ArgAction::SetTrue),
        )
}

/// Parsed command-line options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub directory: PathBuf,
    pub config: Option<PathBuf>,
    pub interactive: bool,
    pub dry_run: bool,
    pub no_format: bool,
}

impl CliOptions {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let directory = matches
            .get_one::<String>("directory")
            .context("missing target directory")?;
        Ok(Self {
            directory: PathBuf::from(directory),
            config: matches.get_one::<String>("config").map(PathBuf::from),
            interactive: matches.get_flag("interactive"),
            dry_run: matches.get_flag("dry-run"),
            no_format: matches.get_flag("no-format"),
        })
    }

    /// The configuration file (or defaults) with the flags applied on top
    pub fn to_config(&self) -> Result<PropagateConfig> {
        let mut config = match &self.config {
            Some(path) => PropagateConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => PropagateConfig::default(),
        };
        if self.interactive {
            config.mode = DecisionMode::Interactive;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.no_format {
            config.formatter = None;
        }
        Ok(config)
    }
}

/// A tracer whose decider matches the configured mode
pub fn build_tracer(config: PropagateConfig) -> Result<FileTracer> {
    let interactive = config.mode == DecisionMode::Interactive;
    let tracer = FileTracer::new(config)?;
    if !interactive {
        return Ok(tracer);
    }
    let reader = TerminalReader::new()?;
    Ok(tracer.with_decider(Box::new(InteractiveDecider::new(reader))))
}

/// Final report printed after a run
pub fn render_summary(summary: &TracerSummary, dry_run: bool) -> String {
    let mut lines = Vec::new();
    if dry_run {
        lines.push("Dry run: no files were written".to_string());
    }
    lines.push(format!(
        "Packages: {}, files: {} processed, {} skipped, {} {}",
        summary.packages,
        summary.files_processed,
        summary.files_skipped,
        summary.files_rewritten,
        if dry_run { "to rewrite" } else { "rewritten" },
    ));
    lines.push(format!(
        "Arguments rewritten: {}, unused renames reverted: {}",
        summary.rewrites, summary.reverted_renames
    ));
    if !summary.errors.is_empty() {
        lines.push("Errors:".to_string());
        lines.extend(summary.errors.iter().map(|e| format!("  {}", e)));
    }
    if let Some(error) = &summary.formatter_error {
        lines.push(format!("Formatter error: {}", error));
    }
    lines.join("\n")
}
