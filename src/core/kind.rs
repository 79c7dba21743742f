//! Primitive kinds and the filename suffix convention that selects them.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::AwdError;

/// The closed set of primitive kinds AWD understands.
///
/// A kind is derived purely from the file name, once, at discovery time.
/// It is never inferred from file content and never changes afterwards.
///
/// # Serialization
///
/// Serializes as a lowercase string (`"chatmode"`, `"instruction"`, ...).
///
/// # Examples
///
/// ```rust
/// use awd_cli::core::PrimitiveKind;
/// use std::path::Path;
///
/// let kind = PrimitiveKind::from_path(Path::new(".awd/python.instructions.md"));
/// assert_eq!(kind, Some(PrimitiveKind::Instruction));
///
/// assert_eq!(PrimitiveKind::from_path(Path::new("README.md")), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// Assistant persona and behavior, optionally scoped by `applyTo`.
    Chatmode,
    /// Guidelines scoped to files matching a required `applyTo` glob.
    Instruction,
    /// Reference material (`.context.md` and `.memory.md`), inlined only through links.
    Context,
    /// Specification documents, inlined only through links.
    Spec,
    /// Independently executable prompt, never part of the compiled document.
    Workflow,
}

/// Suffix table. No entry is a suffix of another, so the first match is the only match.
const SUFFIXES: &[(&str, PrimitiveKind)] = &[
    (".chatmode.md", PrimitiveKind::Chatmode),
    (".instructions.md", PrimitiveKind::Instruction),
    (".context.md", PrimitiveKind::Context),
    (".memory.md", PrimitiveKind::Context),
    (".spec.md", PrimitiveKind::Spec),
    (".prompt.md", PrimitiveKind::Workflow),
];

impl PrimitiveKind {
    /// All kinds, in display order.
    pub const ALL: [PrimitiveKind; 5] = [
        PrimitiveKind::Chatmode,
        PrimitiveKind::Instruction,
        PrimitiveKind::Context,
        PrimitiveKind::Spec,
        PrimitiveKind::Workflow,
    ];

    /// Classify a file by the final two dot-segments of its name.
    ///
    /// Returns `None` for files that are not primitives; those are ignored by
    /// discovery rather than reported as errors. A bare suffix such as
    /// `.chatmode.md` (empty stem) is not a primitive either.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        SUFFIXES.iter().find_map(|(suffix, kind)| {
            file_name
                .strip_suffix(suffix)
                .filter(|stem| !stem.is_empty())
                .map(|_| *kind)
        })
    }

    /// Derive the primitive name from a file path by stripping the kind suffix.
    ///
    /// `python-style.instructions.md` becomes `python-style`.
    #[must_use]
    pub fn primitive_name(path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        SUFFIXES.iter().find_map(|(suffix, _)| {
            file_name
                .strip_suffix(suffix)
                .filter(|stem| !stem.is_empty())
                .map(str::to_string)
        })
    }

    /// Plural label used for grouped listings.
    #[must_use]
    pub const fn plural(&self) -> &'static str {
        match self {
            Self::Chatmode => "Chatmodes",
            Self::Instruction => "Instructions",
            Self::Context => "Context",
            Self::Spec => "Specs",
            Self::Workflow => "Workflows",
        }
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chatmode => write!(f, "chatmode"),
            Self::Instruction => write!(f, "instruction"),
            Self::Context => write!(f, "context"),
            Self::Spec => write!(f, "spec"),
            Self::Workflow => write!(f, "workflow"),
        }
    }
}

impl std::str::FromStr for PrimitiveKind {
    type Err = AwdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chatmode" | "chatmodes" => Ok(Self::Chatmode),
            "instruction" | "instructions" => Ok(Self::Instruction),
            "context" | "memory" => Ok(Self::Context),
            "spec" | "specs" => Ok(Self::Spec),
            "workflow" | "workflows" | "prompt" => Ok(Self::Workflow),
            _ => Err(AwdError::InvalidPrimitiveKind {
                kind: s.to_string(),
            }),
        }
    }
}
