//! Command-line interface for AWD.
//!
//! # Commands
//!
//! - `compile` - Compile primitives into `AGENTS.md` (see [`compile`])
//! - `validate` - Check every primitive file and report problems (see [`validate`])
//! - `list` - Show discovered primitives grouped by kind (see [`list`])
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging on stderr
//! - `--quiet` / `-q`: only errors are logged
//! - `--root <DIR>`: project root (also `AWD_ROOT`), defaults to the current directory
//!
//! `RUST_LOG`, when set, overrides the level chosen by `--verbose`/`--quiet`.
//!
//! # Examples
//!
//! ```bash
//! awd compile                        # write AGENTS.md
//! awd compile --dry-run              # print the document instead
//! awd compile --chatmode backend     # include a specific chatmode
//! awd compile --watch                # recompile on every change
//! awd validate --format json         # machine-readable validation report
//! awd --root ../service list --kind instruction
//! ```

pub mod compile;
pub mod list;
pub mod validate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pattern::to_slash;

/// Top-level command line.
#[derive(Parser, Debug)]
#[command(
    name = "awd",
    about = "Compile agent primitives into AGENTS.md",
    version,
    long_about = "AWD discovers chatmode, instruction, context, spec and workflow primitives in .awd/ and .github/ \
                  and compiles the applicable ones into a single AGENTS.md document."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    ///
    /// Equivalent to `RUST_LOG=debug`. Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Project root directory.
    ///
    /// Defaults to the current directory.
    #[arg(long, global = true, env = "AWD_ROOT", value_name = "DIR")]
    root: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile primitives into AGENTS.md
    Compile(compile::CompileCommand),

    /// Validate every primitive file without compiling
    Validate(validate::ValidateCommand),

    /// List discovered primitives
    List(list::ListCommand),
}

/// Output format shared by all commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

impl Cli {
    /// Log filter directive derived from `--verbose` and `--quiet`.
    ///
    /// Used when `RUST_LOG` is not set.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Run the selected command.
    ///
    /// # Errors
    ///
    /// Whatever the command fails with. The binary turns it into a
    /// user-facing message and exit code 1.
    pub async fn execute(self) -> Result<()> {
        let root = project_root(self.root.as_deref())?;

        match self.command {
            Commands::Compile(cmd) => cmd.execute(&root).await,
            Commands::Validate(cmd) => cmd.execute(&root).await,
            Commands::List(cmd) => cmd.execute(&root).await,
        }
    }
}

/// Resolve the project root: `--root` if given, else the current directory.
///
/// The path is canonicalized when possible so reported paths can be shown
/// relative to it. A root that does not exist is passed through unchanged and
/// reported by the command that tries to read it.
fn project_root(root: Option<&Path>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    Ok(std::fs::canonicalize(&root).unwrap_or(root))
}

/// Show `path` relative to `root` with forward slashes, or as-is when outside it.
pub(crate) fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).map_or_else(|_| path.display().to_string(), to_slash)
}
