//! Section assembly: from a primitive collection to a compiled document.
//!
//! The document shape is driven entirely by the primitives that exist:
//!
//! 1. A generated header.
//! 2. At most one chatmode section ("Development Approach").
//! 3. One section per distinct instruction `applyTo` string, under
//!    "Development Guidelines", ordered lexicographically by the pattern.
//! 4. A generated footer with regeneration instructions.
//!
//! Grouping is syntactic: `**/*.py` and `**/*.{py}` match the same files but
//! form two sections. Context and spec primitives never get sections of their
//! own; they reach the document only through inlined links. Workflows never
//! appear. A `${spec:name}` token in a body is left as written.
//!
//! Only the header carries a timestamp. Everything between header and footer
//! is a pure function of the collection (and the linked files), and its
//! SHA-256 is stamped into the header as the content checksum.

use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tracing::debug;

use crate::core::AwdError;
use crate::markdown::links::{DocumentSource, FsSource, LinkResolver};
use crate::pattern::{PatternMatcher, ProjectFiles};
use crate::primitives::{Primitive, PrimitiveCollection};
use crate::utils::checksum::content_checksum;

const TITLE: &str = "# AGENTS.md";
const APPROACH_HEADING: &str = "Development Approach";
const GUIDELINES_HEADING: &str = "## Development Guidelines";

/// What a section was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    /// The selected chatmode.
    Chatmode {
        /// Chatmode name
        name: String,
    },
    /// All instructions sharing one literal `applyTo` string.
    InstructionGroup {
        /// The `applyTo` pattern, verbatim
        pattern: String,
        /// Project files the pattern matched, when an inventory was supplied
        matched_files: Option<usize>,
    },
}

/// One rendered section of the compiled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// What the section was built from.
    pub kind: SectionKind,
    /// Heading text without the `#` markers.
    pub heading: String,
    /// Concatenated, link-resolved body text.
    pub body: String,
    /// Source files of the primitives merged into this section.
    pub sources: Vec<PathBuf>,
}

impl Section {
    /// Whether this is an instruction group.
    pub fn is_instruction_group(&self) -> bool {
        matches!(self.kind, SectionKind::InstructionGroup { .. })
    }
}

/// The assembled output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument {
    /// Sections in render order: chatmode first, then instruction groups by pattern.
    pub sections: Vec<Section>,
    /// Generation time, RFC 3339. The only non-reproducible part of the output.
    pub generated_at: String,
    /// Version of the tool that generated the document.
    pub version: String,
    /// Non-fatal problems found while assembling (broken links, unmatched patterns).
    pub warnings: Vec<String>,
    /// Patterns whose group was left out because they matched no project file.
    pub omitted_patterns: Vec<String>,
}

impl CompiledDocument {
    /// The chatmode section, if one was included.
    pub fn chatmode_section(&self) -> Option<&Section> {
        self.sections.iter().find(|s| matches!(s.kind, SectionKind::Chatmode { .. }))
    }

    /// The instruction-group sections in order.
    pub fn instruction_groups(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_instruction_group())
    }

    /// Render everything between header and footer.
    ///
    /// Byte-identical across runs on unchanged input.
    pub fn render_sections(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        if let Some(chatmode) = self.chatmode_section() {
            lines.push(format!("## {}", chatmode.heading));
            lines.push(String::new());
            lines.push(chatmode.body.clone());
            lines.push(String::new());
        }

        let groups: Vec<&Section> = self.instruction_groups().collect();
        if !groups.is_empty() {
            lines.push(GUIDELINES_HEADING.to_string());
            lines.push(String::new());
            for group in groups {
                lines.push(format!("### {}", group.heading));
                lines.push(String::new());
                if !group.body.is_empty() {
                    lines.push(group.body.clone());
                    lines.push(String::new());
                }
            }
        }

        lines.join("\n")
    }

    /// SHA-256 of [`render_sections`](Self::render_sections).
    pub fn checksum(&self) -> String {
        content_checksum(&self.render_sections())
    }

    /// Render the complete document: header, sections, footer.
    pub fn render(&self) -> String {
        let sections = self.render_sections();
        let mut out = String::new();

        out.push_str(TITLE);
        out.push('\n');
        out.push_str("<!-- Generated by AWD CLI from .awd/ primitives -->\n");
        out.push_str(&format!("<!-- Generated on: {} -->\n", self.generated_at));
        out.push_str(&format!("<!-- AWD Version: {} -->\n", self.version));
        out.push_str(&format!("<!-- Content checksum: {} -->\n", content_checksum(&sections)));
        out.push('\n');

        if !sections.is_empty() {
            out.push_str(&sections);
            out.push('\n');
        }

        out.push_str("---\n");
        out.push_str("*This file was generated by AWD CLI. Do not edit manually.*\n");
        out.push_str("*To regenerate: `awd compile`*\n");
        out
    }
}

/// Builds a [`CompiledDocument`] from a [`PrimitiveCollection`].
///
/// # Examples
///
/// ```rust,no_run
/// use awd_cli::compiler::assembler::Assembler;
/// use awd_cli::pattern::ProjectFiles;
/// use awd_cli::primitives::discover;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let root = Path::new(".");
/// let collection = discover(root)?;
/// let document = Assembler::new()
///     .with_project_files(ProjectFiles::scan(root, &[])?)
///     .skip_unmatched(true)
///     .assemble(&collection, None)?;
/// print!("{}", document.render());
/// # Ok(())
/// # }
/// ```
pub struct Assembler<S = FsSource> {
    resolver: LinkResolver<S>,
    resolve_links: bool,
    project_files: Option<ProjectFiles>,
    skip_unmatched: bool,
}

impl Default for Assembler<FsSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler<FsSource> {
    /// Assembler that reads linked documents from disk.
    pub fn new() -> Self {
        Self::with_source(FsSource)
    }
}

impl<S: DocumentSource> Assembler<S> {
    /// Assembler reading linked documents from `source`.
    pub fn with_source(source: S) -> Self {
        Self {
            resolver: LinkResolver::new(source),
            resolve_links: true,
            project_files: None,
            skip_unmatched: false,
        }
    }

    /// Enable or disable link inlining (enabled by default).
    #[must_use]
    pub fn resolve_links(mut self, enabled: bool) -> Self {
        self.resolve_links = enabled;
        self
    }

    /// Evaluate `applyTo` patterns against this inventory.
    ///
    /// Without an inventory every instruction group is included and
    /// [`SectionKind::InstructionGroup::matched_files`] is `None`.
    #[must_use]
    pub fn with_project_files(mut self, files: ProjectFiles) -> Self {
        self.project_files = Some(files);
        self
    }

    /// Omit instruction groups whose pattern matches no project file.
    ///
    /// Off by default: such groups are kept and reported as warnings.
    #[must_use]
    pub fn skip_unmatched(mut self, skip: bool) -> Self {
        self.skip_unmatched = skip;
        self
    }

    /// Assemble the document.
    ///
    /// Chatmode selection:
    /// - `Some(name)`: that chatmode, or [`AwdError::ChatmodeNotFound`].
    /// - `None`: the chatmode without `applyTo` if exactly one exists;
    ///   otherwise no chatmode section.
    ///
    /// # Errors
    ///
    /// Only [`AwdError::ChatmodeNotFound`].
    pub fn assemble(
        &self,
        collection: &PrimitiveCollection,
        selected_chatmode: Option<&str>,
    ) -> Result<CompiledDocument, AwdError> {
        let mut warnings = Vec::new();
        let mut sections = Vec::new();
        let mut omitted_patterns = Vec::new();

        if let Some(chatmode) = select_chatmode(collection, selected_chatmode, &mut warnings)? {
            debug!("Using chatmode '{}'", chatmode.name);
            sections.push(self.chatmode_section(chatmode, &mut warnings));
        }

        let mut groups: BTreeMap<&str, Vec<&Primitive>> = BTreeMap::new();
        for instruction in collection.instructions() {
            if let Some(pattern) = instruction.apply_to.as_deref() {
                groups.entry(pattern).or_default().push(instruction);
            }
        }

        for (pattern, members) in groups {
            let matched_files = self.count_matches(pattern);
            if matched_files == Some(0) {
                if self.skip_unmatched {
                    warnings.push(format!("Pattern `{pattern}` matches no project files; section omitted"));
                    omitted_patterns.push(pattern.to_string());
                    continue;
                }
                warnings.push(format!("Pattern `{pattern}` matches no project files"));
            }

            let bodies: Vec<String> = members
                .iter()
                .map(|member| self.body_of(member, &mut warnings))
                .filter(|body| !body.is_empty())
                .collect();

            sections.push(Section {
                kind: SectionKind::InstructionGroup {
                    pattern: pattern.to_string(),
                    matched_files,
                },
                heading: format!("Files matching `{pattern}`"),
                body: bodies.join("\n\n"),
                sources: members.iter().map(|m| m.source_path.clone()).collect(),
            });
        }

        Ok(CompiledDocument {
            sections,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            version: env!("CARGO_PKG_VERSION").to_string(),
            warnings,
            omitted_patterns,
        })
    }

    fn chatmode_section(&self, chatmode: &Primitive, warnings: &mut Vec<String>) -> Section {
        let body = self.body_of(chatmode, warnings);
        let body = match chatmode.description.as_deref() {
            Some(description) => format!("*{description}*\n\n{body}"),
            None => body,
        };

        Section {
            kind: SectionKind::Chatmode {
                name: chatmode.name.clone(),
            },
            heading: APPROACH_HEADING.to_string(),
            body,
            sources: vec![chatmode.source_path.clone()],
        }
    }

    /// Trimmed body of one primitive, with links inlined when enabled.
    fn body_of(&self, primitive: &Primitive, warnings: &mut Vec<String>) -> String {
        if !self.resolve_links {
            return primitive.body.trim().to_string();
        }

        let mut seen = HashSet::new();
        let resolved = self.resolver.resolve_links(&primitive.body, &primitive.source_path, &mut seen);
        warnings.extend(resolved.warnings.iter().map(ToString::to_string));
        resolved.text.trim().to_string()
    }

    fn count_matches(&self, pattern: &str) -> Option<usize> {
        let files = self.project_files.as_ref()?;
        let matcher = PatternMatcher::new(pattern).ok()?;
        Some(files.matching(&matcher).count())
    }
}

/// Assemble with on-disk link resolution and no project inventory.
///
/// Every instruction group is included. See [`Assembler::assemble`].
///
/// # Errors
///
/// [`AwdError::ChatmodeNotFound`] when `selected_chatmode` names no valid chatmode.
pub fn assemble(
    collection: &PrimitiveCollection,
    selected_chatmode: Option<&str>,
    resolve_links: bool,
) -> Result<CompiledDocument, AwdError> {
    Assembler::new().resolve_links(resolve_links).assemble(collection, selected_chatmode)
}

fn select_chatmode<'a>(
    collection: &'a PrimitiveCollection,
    requested: Option<&str>,
    warnings: &mut Vec<String>,
) -> Result<Option<&'a Primitive>, AwdError> {
    if let Some(name) = requested {
        return collection.find_chatmode(name).map(Some).ok_or_else(|| AwdError::ChatmodeNotFound {
            name: name.to_string(),
            available: collection.chatmodes().map(|c| c.name.clone()).collect(),
        });
    }

    let global: Vec<&Primitive> = collection.chatmodes().filter(|c| c.apply_to.is_none()).collect();
    match global.as_slice() {
        [only] => Ok(Some(*only)),
        [] => Ok(None),
        many => {
            let names: Vec<&str> = many.iter().map(|c| c.name.as_str()).collect();
            warnings.push(format!(
                "Multiple global chatmodes ({}); pass --chatmode to include one",
                names.join(", ")
            ));
            Ok(None)
        }
    }
}
