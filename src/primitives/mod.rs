//! Agent primitives: model, parsing and discovery.
//!
//! A primitive is one markdown file with optional YAML frontmatter whose kind
//! is given by its file-name suffix (see [`PrimitiveKind`]). Discovery turns a
//! project tree into a [`PrimitiveCollection`]: the valid primitives in a
//! deterministic order plus one [`DiscoveryError`] per file that failed to
//! parse. A bad file never aborts discovery.
//!
//! # Frontmatter
//!
//! ```markdown
//! ---
//! description: Python coding standards
//! applyTo: "**/*.py"
//! author: platform-team
//! version: "1.2"
//! mcp: [github]
//! input: [module]
//! ---
//!
//! Use type hints on every public function.
//! ```
//!
//! `description` and `applyTo` drive compilation. `author`, `version`, `mcp` and
//! `input` are typed passthrough fields. Any other key is preserved verbatim in
//! [`PrimitiveMetadata::extra`].

pub mod discovery;
mod parser;

pub use discovery::discover;
pub use parser::{ParseError, parse_primitive};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use crate::core::PrimitiveKind;

/// Passthrough frontmatter fields that do not affect compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrimitiveMetadata {
    /// Author, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Version string, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// MCP server identifiers this primitive depends on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mcp: Vec<String>,
    /// Input parameter names used as `${input:name}` in the body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<String>,
    /// Every other frontmatter key, untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One valid, parsed primitive file.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Kind derived from the file name. Never changes after parsing.
    pub kind: PrimitiveKind,
    /// File name without the kind suffix.
    pub name: String,
    /// Human-readable description from frontmatter.
    pub description: Option<String>,
    /// `applyTo` glob. Always `Some` for instructions, optional for chatmodes
    /// and `None` for every other kind.
    pub apply_to: Option<String>,
    /// Markdown after the frontmatter block.
    pub body: String,
    /// Where the file was read from. Link targets resolve relative to it.
    pub source_path: PathBuf,
    /// Passthrough frontmatter.
    pub metadata: PrimitiveMetadata,
}

impl Primitive {
    /// One-line summary: the description, else the first `# ` heading of the body.
    pub fn summary(&self) -> Option<String> {
        self.description.clone().or_else(|| {
            self.body
                .lines()
                .map(str::trim)
                .find_map(|line| line.strip_prefix("# "))
                .map(|heading| heading.trim().to_string())
        })
    }
}

/// A file that was recognized as a primitive but failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryError {
    /// The offending file.
    pub path: PathBuf,
    /// What was wrong with it.
    pub error: ParseError,
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// The result of one discovery pass.
///
/// `primitives` is ordered by (directory depth, directory, file name) of the
/// source files, so two passes over an unchanged tree are identical.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveCollection {
    /// Valid primitives in discovery order.
    pub primitives: Vec<Primitive>,
    /// One entry per invalid file, in discovery order.
    pub errors: Vec<DiscoveryError>,
}

impl PrimitiveCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a valid primitive.
    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Record a file that failed to parse.
    pub fn add_error(&mut self, path: PathBuf, error: ParseError) {
        self.errors.push(DiscoveryError {
            path,
            error,
        });
    }

    /// Valid primitives of one kind, in discovery order.
    pub fn of_kind(&self, kind: PrimitiveKind) -> impl Iterator<Item = &Primitive> {
        self.primitives.iter().filter(move |p| p.kind == kind)
    }

    /// Valid chatmodes.
    pub fn chatmodes(&self) -> impl Iterator<Item = &Primitive> {
        self.of_kind(PrimitiveKind::Chatmode)
    }

    /// Valid instructions.
    pub fn instructions(&self) -> impl Iterator<Item = &Primitive> {
        self.of_kind(PrimitiveKind::Instruction)
    }

    /// Valid context and memory files.
    pub fn contexts(&self) -> impl Iterator<Item = &Primitive> {
        self.of_kind(PrimitiveKind::Context)
    }

    /// Valid workflows.
    pub fn workflows(&self) -> impl Iterator<Item = &Primitive> {
        self.of_kind(PrimitiveKind::Workflow)
    }

    /// Look up a chatmode by name.
    pub fn find_chatmode(&self, name: &str) -> Option<&Primitive> {
        self.chatmodes().find(|p| p.name == name)
    }

    /// Number of valid primitives.
    pub fn count(&self) -> usize {
        self.primitives.len()
    }

    /// Number of valid primitives of one kind.
    pub fn count_of(&self, kind: PrimitiveKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Whether any file failed to parse.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Valid and invalid files together.
    pub fn total_files(&self) -> usize {
        self.primitives.len() + self.errors.len()
    }
}
