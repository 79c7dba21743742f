//! Frontmatter splitting for primitive files.
//!
//! A primitive starts with an optional `---` fenced block. This module only
//! separates that block from the body; interpreting the block as YAML is the
//! job of [`crate::primitives::parse_primitive`].
//!
//! Extraction goes through `gray_matter` with a custom engine that hands back
//! the raw block text untouched, so YAML errors surface in one place with our
//! own error messages.

use gray_matter::{Matter, Pod, engine::Engine};
use std::fmt::Debug;
use thiserror::Error;

const DELIMITER: &str = "---";

/// Custom gray_matter engine that returns raw frontmatter text without parsing.
struct RawFrontmatter;

impl Engine for RawFrontmatter {
    fn parse(content: &str) -> Result<Pod, gray_matter::Error> {
        Ok(Pod::String(content.to_string()))
    }
}

/// Failure to locate a well-formed frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    /// The opening `---` line has no matching closing line.
    #[error("frontmatter block opened with '---' is never closed")]
    Unclosed,
}

/// A document split into its raw frontmatter text and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDocument {
    /// Raw text between the delimiters, trimmed. `None` when the file has no
    /// frontmatter block or the block is empty.
    pub frontmatter: Option<String>,
    /// Everything after the closing delimiter.
    pub body: String,
}

/// Splits primitive files into frontmatter and body.
pub struct FrontmatterParser {
    raw_matter: Matter<RawFrontmatter>,
}

impl Debug for FrontmatterParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontmatterParser").finish()
    }
}

impl Default for FrontmatterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FrontmatterParser {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl FrontmatterParser {
    /// Create a new frontmatter parser.
    pub fn new() -> Self {
        Self {
            raw_matter: Matter::new(),
        }
    }

    /// Split `content` into raw frontmatter and body.
    ///
    /// # Errors
    ///
    /// Returns [`FrontmatterError::Unclosed`] when the first line is `---` and
    /// no later line closes the block.
    ///
    /// # Example
    ///
    /// ```rust
    /// use awd_cli::markdown::frontmatter::FrontmatterParser;
    ///
    /// let parser = FrontmatterParser::new();
    /// let doc = parser.split("---\ndescription: Demo\n---\n\nBody text\n").unwrap();
    /// assert_eq!(doc.frontmatter.as_deref(), Some("description: Demo"));
    /// assert_eq!(doc.body.trim(), "Body text");
    ///
    /// assert!(parser.split("---\ndescription: Demo\n").is_err());
    /// ```
    pub fn split(&self, content: &str) -> Result<SplitDocument, FrontmatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if !opens_frontmatter(content) {
            return Ok(SplitDocument {
                frontmatter: None,
                body: content.to_string(),
            });
        }

        if !closes_frontmatter(content) {
            return Err(FrontmatterError::Unclosed);
        }

        match self.raw_matter.parse::<String>(content) {
            Ok(result) => Ok(SplitDocument {
                frontmatter: result.data.filter(|text| !text.trim().is_empty()),
                body: result.content,
            }),
            // The raw engine cannot fail, but gray_matter may still reject the input
            Err(_) => Ok(split_by_lines(content)),
        }
    }

    /// Return `content` without its frontmatter block.
    ///
    /// Lenient: content with an unclosed block is returned unchanged. Used
    /// when inlining linked documents, where a malformed header must not stop
    /// the splice.
    pub fn strip_frontmatter(&self, content: &str) -> String {
        self.split(content).map(|doc| doc.body).unwrap_or_else(|_| content.to_string())
    }
}

fn opens_frontmatter(content: &str) -> bool {
    content
        .lines()
        .next()
        .is_some_and(|line| line.trim_end() == DELIMITER)
}

fn closes_frontmatter(content: &str) -> bool {
    content.lines().skip(1).any(|line| line.trim_end() == DELIMITER)
}

fn split_by_lines(content: &str) -> SplitDocument {
    let mut lines = content.lines().skip(1);
    let mut matter = Vec::new();
    for line in lines.by_ref() {
        if line.trim_end() == DELIMITER {
            break;
        }
        matter.push(line);
    }
    let matter = matter.join("\n");
    let body: Vec<&str> = lines.collect();

    SplitDocument {
        frontmatter: Some(matter.trim().to_string()).filter(|text| !text.is_empty()),
        body: body.join("\n").trim_start().to_string(),
    }
}
