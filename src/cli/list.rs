//! `awd list`: show every discovered primitive grouped by kind.
//!
//! Workflows are listed too, even though they never reach the compiled
//! document. Each entry shows the frontmatter description, or the first
//! `# ` heading of the body when there is none.
//!
//! # Examples
//!
//! ```bash
//! awd list
//! awd list --kind instruction
//! awd list --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use super::{OutputFormat, display_path};
use crate::core::PrimitiveKind;
use crate::primitives::{Primitive, PrimitiveCollection, discover};

/// Arguments for `awd list`.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Only list primitives of this kind (chatmode, instruction, context, spec, workflow)
    #[arg(long, value_name = "KIND")]
    kind: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct ListEntry {
    kind: PrimitiveKind,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "applyTo", skip_serializing_if = "Option::is_none")]
    apply_to: Option<String>,
    path: String,
}

#[derive(Debug, Serialize)]
struct ListErrorEntry {
    path: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    primitives: Vec<ListEntry>,
    errors: Vec<ListErrorEntry>,
}

impl ListCommand {
    /// List primitives found under `project_root`.
    ///
    /// # Errors
    ///
    /// Fails on an unknown `--kind` or an unreadable project root.
    pub async fn execute(self, project_root: &Path) -> Result<()> {
        let kind_filter = self.kind.as_deref().map(str::parse::<PrimitiveKind>).transpose()?;
        let collection = discover(project_root)?;
        let kinds: Vec<PrimitiveKind> = PrimitiveKind::ALL
            .into_iter()
            .filter(|kind| kind_filter.is_none_or(|wanted| wanted == *kind))
            .collect();

        match self.format {
            OutputFormat::Json => {
                let output = build_output(project_root, &collection, &kinds);
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => print_text(project_root, &collection, &kinds),
        }
        Ok(())
    }
}

fn entry(project_root: &Path, primitive: &Primitive) -> ListEntry {
    ListEntry {
        kind: primitive.kind,
        name: primitive.name.clone(),
        description: primitive.summary(),
        apply_to: primitive.apply_to.clone(),
        path: display_path(project_root, &primitive.source_path),
    }
}

fn build_output(project_root: &Path, collection: &PrimitiveCollection, kinds: &[PrimitiveKind]) -> ListOutput {
    ListOutput {
        primitives: kinds
            .iter()
            .flat_map(|kind| collection.of_kind(*kind))
            .map(|primitive| entry(project_root, primitive))
            .collect(),
        errors: collection
            .errors
            .iter()
            .map(|e| ListErrorEntry {
                path: display_path(project_root, &e.path),
                error: e.error.to_string(),
            })
            .collect(),
    }
}

fn print_text(project_root: &Path, collection: &PrimitiveCollection, kinds: &[PrimitiveKind]) {
    let mut shown = 0;

    for kind in kinds {
        let primitives: Vec<&Primitive> = collection.of_kind(*kind).collect();
        if primitives.is_empty() {
            continue;
        }

        if shown > 0 {
            println!();
        }
        println!("{} ({}):", kind.plural().bold(), primitives.len());
        for primitive in primitives {
            let summary = primitive.summary().unwrap_or_default();
            let scope = primitive
                .apply_to
                .as_deref()
                .map(|pattern| format!(" [{}]", pattern.cyan()))
                .unwrap_or_default();
            if summary.is_empty() {
                println!("  {}{}", primitive.name.green(), scope);
            } else {
                println!("  {}{} - {}", primitive.name.green(), scope, summary);
            }
            println!("    {}", display_path(project_root, &primitive.source_path).dimmed());
            shown += 1;
        }
    }

    if shown == 0 {
        println!("No primitives found");
    }

    if !collection.errors.is_empty() {
        println!();
        println!("{} ({}):", "Invalid files".red().bold(), collection.errors.len());
        for error in &collection.errors {
            println!("  {} {}: {}", "✗".red(), display_path(project_root, &error.path), error.error);
        }
    }
}
