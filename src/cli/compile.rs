//! `awd compile`: build `AGENTS.md` from the project's primitives.
//!
//! # Examples
//!
//! ```bash
//! awd compile                          # write AGENTS.md at the project root
//! awd compile --output docs/AGENTS.md  # custom output path
//! awd compile --chatmode backend       # include a specific chatmode
//! awd compile --dry-run                # print instead of writing
//! awd compile --no-links               # keep markdown links as written
//! awd compile --validate               # report problems only, like `awd validate`
//! awd compile --watch                  # recompile whenever a primitive changes
//! ```
//!
//! Flags override the `[compile]` table of `awd.toml`, which overrides the
//! built-in defaults.
//!
//! Files that fail to parse are reported and skipped; the compile still
//! succeeds with the remaining primitives. A `--chatmode` that does not exist
//! fails before anything is written.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use super::validate::report_validation;
use super::{OutputFormat, display_path};
use crate::compiler::watch::{RelevanceFilter, run_watch, watch_project};
use crate::compiler::{CompileOptions, CompileResult, CompileStats, compile};
use crate::config::{CompileOverrides, ProjectConfig};

/// Arguments for `awd compile`.
#[derive(Args, Debug)]
pub struct CompileCommand {
    /// Output file, relative to the project root
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Chatmode to include in the document
    #[arg(long, value_name = "NAME")]
    chatmode: Option<String>,

    /// Print the document to stdout instead of writing it
    #[arg(long)]
    dry_run: bool,

    /// Do not inline linked markdown files
    #[arg(long)]
    no_links: bool,

    /// Recompile whenever a primitive changes
    #[arg(long, conflicts_with_all = ["dry_run", "validate"])]
    watch: bool,

    /// Only validate primitives; do not write
    #[arg(long)]
    validate: bool,

    /// Omit instruction groups whose pattern matches no project file
    #[arg(long)]
    skip_unmatched: bool,

    /// Output format for the compile report
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Machine-readable compile report (`--format json`).
#[derive(Debug, Serialize)]
struct CompileReport<'a> {
    output: String,
    written: bool,
    stats: &'a CompileStats,
    errors: Vec<String>,
    warnings: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

impl CompileCommand {
    /// Run the compile command in `project_root`.
    ///
    /// # Errors
    ///
    /// Fails on an unknown `--chatmode`, an unreadable root, an unwritable
    /// output, a malformed `awd.toml`, or when `--validate` finds invalid files.
    pub async fn execute(self, project_root: &Path) -> Result<()> {
        let config = ProjectConfig::load(project_root)?;
        let options = config.compile_options(&self.overrides());

        if self.watch {
            return watch(project_root, &options, config.debounce(), self.format).await;
        }

        let result = compile(project_root, &options)?;
        if options.validate_only {
            return report_validation(project_root, &result, self.format);
        }

        report(project_root, &result, self.format)
    }

    fn overrides(&self) -> CompileOverrides {
        CompileOverrides {
            output: self.output.clone(),
            chatmode: self.chatmode.clone(),
            resolve_links: self.no_links.then_some(false),
            skip_unmatched: self.skip_unmatched.then_some(true),
            dry_run: self.dry_run,
            validate_only: self.validate,
        }
    }
}

fn report(project_root: &Path, result: &CompileResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let report = CompileReport {
                output: display_path(project_root, &result.output_path),
                written: result.written,
                stats: &result.stats,
                errors: result
                    .diagnostics
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", display_path(project_root, &e.path), e.error))
                    .collect(),
                warnings: &result.diagnostics.warnings,
                content: if result.written { None } else { result.content.as_deref() },
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print_diagnostics(project_root, result);
            if result.written {
                print_summary(project_root, result);
            } else if let Some(content) = &result.content {
                print!("{content}");
            }
        }
    }
    Ok(())
}

/// Skipped files and warnings go to stderr so a dry run's stdout is only the document.
fn print_diagnostics(project_root: &Path, result: &CompileResult) {
    for error in &result.diagnostics.errors {
        eprintln!("{} Skipped {}: {}", "✗".red(), display_path(project_root, &error.path), error.error);
    }
    for warning in &result.diagnostics.warnings {
        eprintln!("{} {}", "⚠".yellow(), warning);
    }
}

fn print_summary(project_root: &Path, result: &CompileResult) {
    let stats = &result.stats;
    println!(
        "{} Compiled {} ({} sections, {} bytes)",
        "✓".green(),
        display_path(project_root, &result.output_path).bold(),
        stats.sections,
        stats.content_length
    );
    println!(
        "  Primitives: {} ({} chatmodes, {} instructions, {} context, {} specs, {} workflows)",
        stats.primitives_found, stats.chatmodes, stats.instructions, stats.contexts, stats.specs, stats.workflows
    );
    println!(
        "  Instruction groups: {} ({} matching no files)",
        stats.instruction_groups, stats.unmatched_groups
    );
    if stats.invalid_files > 0 {
        println!("  Invalid files skipped: {}", stats.invalid_files);
    }
}

async fn watch(project_root: &Path, options: &CompileOptions, debounce: Duration, format: OutputFormat) -> Result<()> {
    let compile_once = || -> Result<()> {
        let result = compile(project_root, options)?;
        report(project_root, &result, format)
    };

    if let Err(e) = compile_once() {
        warn!("Initial compile failed: {:#}", e);
    }

    let output_path = if options.output_path.is_absolute() {
        options.output_path.clone()
    } else {
        project_root.join(&options.output_path)
    };
    let filter = RelevanceFilter::new(project_root, output_path, &options.ignored_dirs);
    let (_watcher, events) = watch_project(project_root, filter)?;

    println!(
        "Watching {} for changes (debounce {} ms). Press Ctrl-C to stop.",
        project_root.display(),
        debounce.as_millis()
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let summary = run_watch(events, shutdown, debounce, compile_once).await;

    println!(
        "Stopped watching after {} recompiles ({} failed)",
        summary.recompiles, summary.failures
    );
    Ok(())
}
