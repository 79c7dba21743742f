//! `awd validate`: check every primitive file without compiling.
//!
//! Equivalent to `awd compile --validate`. Every discovered file is listed
//! with ✓ or ✗ and the reason it was rejected; the command fails when any
//! file is invalid.
//!
//! # Examples
//!
//! ```bash
//! awd validate
//! awd validate --format json
//! ```
//!
//! # Output
//!
//! ```text
//! Validating primitives in /work/project
//! ✓ .awd/chatmodes/default.chatmode.md (chatmode 'default')
//! ✗ .awd/instructions/broken.instructions.md: missing required field 'applyTo'
//!
//! 2 files checked: 1 valid, 1 invalid
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use super::{OutputFormat, display_path};
use crate::compiler::{CompileResult, compile};
use crate::config::{CompileOverrides, ProjectConfig};
use crate::core::{AwdError, PrimitiveKind};

/// Arguments for `awd validate`.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ValidateCommand {
    /// Run validation in `project_root`.
    ///
    /// # Errors
    ///
    /// [`AwdError::ValidationFailed`] when any primitive file is invalid, or
    /// the error that stopped discovery.
    pub async fn execute(self, project_root: &Path) -> Result<()> {
        let config = ProjectConfig::load(project_root)?;
        let options = config.compile_options(&CompileOverrides {
            validate_only: true,
            ..CompileOverrides::default()
        });

        let result = compile(project_root, &options)?;
        report_validation(project_root, &result, self.format)
    }
}

/// Validation outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Path relative to the project root
    pub path: String,
    /// Kind, for files that parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<PrimitiveKind>,
    /// Primitive name, for files that parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the file is a valid primitive
    pub valid: bool,
    /// Why the file was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validation outcome for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True when every file is valid
    pub valid: bool,
    /// Number of primitive files checked
    pub total: usize,
    /// Number of valid files
    pub valid_count: usize,
    /// Number of invalid files
    pub invalid_count: usize,
    /// One entry per file, sorted by path
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    /// Build the report for a compile result.
    pub fn from_result(project_root: &Path, result: &CompileResult) -> Self {
        let mut files: Vec<FileReport> = result
            .collection
            .primitives
            .iter()
            .map(|primitive| FileReport {
                path: display_path(project_root, &primitive.source_path),
                kind: Some(primitive.kind),
                name: Some(primitive.name.clone()),
                valid: true,
                error: None,
            })
            .chain(result.diagnostics.errors.iter().map(|e| FileReport {
                path: display_path(project_root, &e.path),
                kind: None,
                name: None,
                valid: false,
                error: Some(e.error.to_string()),
            }))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let invalid_count = result.diagnostics.errors.len();
        Self {
            valid: invalid_count == 0,
            total: files.len(),
            valid_count: files.len() - invalid_count,
            invalid_count,
            files,
        }
    }
}

/// Print a validation report and fail when any file is invalid.
///
/// Shared by `awd validate` and `awd compile --validate`.
pub(crate) fn report_validation(project_root: &Path, result: &CompileResult, format: OutputFormat) -> Result<()> {
    let report = ValidationReport::from_result(project_root, result);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(project_root, &report),
    }

    if report.valid {
        Ok(())
    } else {
        Err(AwdError::ValidationFailed {
            count: report.invalid_count,
        }
        .into())
    }
}

fn print_text(project_root: &Path, report: &ValidationReport) {
    println!("Validating primitives in {}", project_root.display());

    if report.files.is_empty() {
        println!("No primitive files found in .awd/, .github/ or the project root");
        return;
    }

    for file in &report.files {
        match (&file.error, file.kind, &file.name) {
            (Some(error), _, _) => println!("{} {}: {}", "✗".red(), file.path, error),
            (None, Some(kind), Some(name)) => println!("{} {} ({} '{}')", "✓".green(), file.path, kind, name),
            _ => println!("{} {}", "✓".green(), file.path),
        }
    }

    println!();
    println!(
        "{} files checked: {} valid, {} invalid",
        report.total, report.valid_count, report.invalid_count
    );
}
