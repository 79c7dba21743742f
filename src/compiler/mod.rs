//! The compile pipeline.
//!
//! ```text
//! discover ──► (validate_only? stop) ──► scan project files ──► assemble ──► render ──► write
//! ```
//!
//! [`compile`] is a pure function of the project root, the options and the
//! file system at call time. No state is kept between calls; watch mode (see
//! [`watch`]) simply calls it again.
//!
//! Failure policy:
//! - Invalid primitive files are diagnostics, never errors. A normal compile
//!   still writes a document built from the valid primitives.
//! - Broken links and unmatched patterns are warnings.
//! - An explicitly requested chatmode that does not exist aborts the compile
//!   before anything is written.
//! - I/O failures on the project root or the output file abort the compile.

pub mod assembler;
pub mod watch;

pub use assembler::{Assembler, CompiledDocument, Section, SectionKind, assemble};

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{DEFAULT_IGNORED_DIRS, DEFAULT_OUTPUT};
use crate::core::{AwdError, PrimitiveKind};
use crate::pattern::ProjectFiles;
use crate::primitives::{DiscoveryError, PrimitiveCollection, discover};
use crate::utils::fs::safe_write;

/// Options for one compile invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Output file. Relative paths are resolved against the project root.
    pub output_path: PathBuf,
    /// Chatmode to include by name. `None` picks the single global chatmode, if any.
    pub chatmode: Option<String>,
    /// Inline local markdown links.
    pub resolve_links: bool,
    /// Assemble but do not write.
    pub dry_run: bool,
    /// Discover and report only; no assembly, no write.
    pub validate_only: bool,
    /// Omit instruction groups whose pattern matches no project file.
    pub skip_unmatched: bool,
    /// Directory names excluded from the project file inventory.
    pub ignored_dirs: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            chatmode: None,
            resolve_links: true,
            dry_run: false,
            validate_only: false,
            skip_unmatched: false,
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|d| (*d).to_string()).collect(),
        }
    }
}

/// Problems reported by a compile that did not abort it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Files that failed to parse and were left out.
    pub errors: Vec<DiscoveryError>,
    /// Broken links, unmatched patterns and similar.
    pub warnings: Vec<String>,
}

/// Counts describing a compile run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    /// Valid primitives discovered.
    pub primitives_found: usize,
    /// Valid chatmodes.
    pub chatmodes: usize,
    /// Valid instructions.
    pub instructions: usize,
    /// Valid context and memory files.
    pub contexts: usize,
    /// Valid specs.
    pub specs: usize,
    /// Valid workflows.
    pub workflows: usize,
    /// Files that failed to parse.
    pub invalid_files: usize,
    /// Sections in the compiled document.
    pub sections: usize,
    /// Instruction-group sections in the compiled document.
    pub instruction_groups: usize,
    /// Instruction groups whose pattern matched no project file.
    pub unmatched_groups: usize,
    /// Length of the rendered document in bytes.
    pub content_length: usize,
}

/// Outcome of [`compile`].
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// Everything discovery found.
    pub collection: PrimitiveCollection,
    /// The assembled document; `None` in validate-only mode.
    pub document: Option<CompiledDocument>,
    /// The rendered document; `None` in validate-only mode.
    pub content: Option<String>,
    /// Non-fatal problems.
    pub diagnostics: Diagnostics,
    /// Absolute output path the document was (or would have been) written to.
    pub output_path: PathBuf,
    /// Whether the output file was written.
    pub written: bool,
    /// Run statistics.
    pub stats: CompileStats,
}

impl CompileResult {
    /// True when every discovered file parsed.
    pub fn is_valid(&self) -> bool {
        self.diagnostics.errors.is_empty()
    }
}

/// Run the compile pipeline over `project_root`.
///
/// # Errors
///
/// - [`AwdError::ProjectRootUnreadable`] when the root cannot be listed
/// - [`AwdError::ChatmodeNotFound`] when `options.chatmode` names no valid chatmode
/// - [`AwdError::OutputWriteFailed`] when the document cannot be written
///
/// # Examples
///
/// ```rust,no_run
/// use awd_cli::compiler::{CompileOptions, compile};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let result = compile(Path::new("."), &CompileOptions::default())?;
/// for error in &result.diagnostics.errors {
///     eprintln!("skipped {error}");
/// }
/// println!("wrote {}", result.output_path.display());
/// # Ok(())
/// # }
/// ```
pub fn compile(project_root: &Path, options: &CompileOptions) -> Result<CompileResult> {
    let root = std::fs::canonicalize(project_root).map_err(|e| AwdError::ProjectRootUnreadable {
        path: project_root.display().to_string(),
        reason: e.to_string(),
    })?;
    let output_path = if options.output_path.is_absolute() {
        options.output_path.clone()
    } else {
        root.join(&options.output_path)
    };

    let collection = discover(&root)?;
    info!(
        "Discovered {} primitives ({} invalid) in {}",
        collection.count(),
        collection.errors.len(),
        root.display()
    );

    let mut diagnostics = Diagnostics {
        errors: collection.errors.clone(),
        warnings: Vec::new(),
    };
    let mut stats = collection_stats(&collection);

    if options.validate_only {
        return Ok(CompileResult {
            collection,
            document: None,
            content: None,
            diagnostics,
            output_path,
            written: false,
            stats,
        });
    }

    let mut project_files = ProjectFiles::scan(&root, &options.ignored_dirs)?;
    if let Ok(relative_output) = output_path.strip_prefix(&root) {
        project_files.remove(relative_output);
    }

    let document = Assembler::new()
        .resolve_links(options.resolve_links)
        .with_project_files(project_files)
        .skip_unmatched(options.skip_unmatched)
        .assemble(&collection, options.chatmode.as_deref())?;
    let content = document.render();

    diagnostics.warnings.extend(document.warnings.iter().cloned());
    stats.sections = document.sections.len();
    stats.instruction_groups = document.instruction_groups().count();
    stats.unmatched_groups = document
        .sections
        .iter()
        .filter(|s| matches!(s.kind, SectionKind::InstructionGroup { matched_files: Some(0), .. }))
        .count()
        + document.omitted_patterns.len();
    stats.content_length = content.len();

    let written = if options.dry_run {
        debug!("Dry run, not writing {}", output_path.display());
        false
    } else {
        safe_write(&output_path, &content).map_err(|e| AwdError::OutputWriteFailed {
            path: output_path.display().to_string(),
            reason: format!("{e:#}"),
        })?;
        info!("Wrote {} ({} bytes)", output_path.display(), content.len());
        true
    };

    Ok(CompileResult {
        collection,
        document: Some(document),
        content: Some(content),
        diagnostics,
        output_path,
        written,
        stats,
    })
}

fn collection_stats(collection: &PrimitiveCollection) -> CompileStats {
    CompileStats {
        primitives_found: collection.count(),
        chatmodes: collection.count_of(PrimitiveKind::Chatmode),
        instructions: collection.count_of(PrimitiveKind::Instruction),
        contexts: collection.count_of(PrimitiveKind::Context),
        specs: collection.count_of(PrimitiveKind::Spec),
        workflows: collection.count_of(PrimitiveKind::Workflow),
        invalid_files: collection.errors.len(),
        ..CompileStats::default()
    }
}
