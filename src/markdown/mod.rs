//! Markdown handling for primitive files.
//!
//! - [`frontmatter`] separates the `---` fenced YAML block from the body
//! - [`links`] inlines the content of locally linked markdown documents
//!
//! Neither module knows about primitive kinds; they operate on plain text
//! and paths.

pub mod frontmatter;
pub mod links;

pub use frontmatter::{FrontmatterError, FrontmatterParser, SplitDocument};
pub use links::{DocumentSource, FsSource, LinkResolver, LinkWarning, ResolvedText};
