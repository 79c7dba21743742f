//! `applyTo` pattern evaluation.
//!
//! Instruction and chatmode primitives scope themselves to project files with
//! a glob in their `applyTo` field. A pattern *applies* when at least one file
//! in the project inventory matches it.
//!
//! # Pattern Syntax
//!
//! - `*` matches any sequence of characters within a single path component
//! - `**` matches any sequence of path components (`**/*.py` also matches `main.py`)
//! - `?` matches any single character
//! - `[abc]` / `[a-z]` character classes
//! - `{ts,tsx}` alternation
//!
//! Matching always happens against project-relative paths with forward
//! slashes, whatever the host OS.
//!
//! # Inventory
//!
//! [`ProjectFiles`] is the candidate set patterns are checked against. It is
//! built by walking the project tree once per compilation, skipping
//! version-control and dependency directories (see
//! [`crate::constants::DEFAULT_IGNORED_DIRS`]).

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeSet;
use std::path::{Component, Path};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// A compiled `applyTo` glob.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    matcher: GlobMatcher,
    original_pattern: String,
}

impl PatternMatcher {
    /// Compile a glob pattern.
    ///
    /// # Errors
    ///
    /// Fails when the pattern is empty or not valid glob syntax (for example an
    /// unclosed `{` or `[`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use awd_cli::pattern::PatternMatcher;
    ///
    /// let matcher = PatternMatcher::new("**/*.{ts,tsx}").unwrap();
    /// assert!(matcher.matches_str("src/app/view.tsx"));
    /// assert!(!matcher.matches_str("src/app/view.js"));
    ///
    /// assert!(PatternMatcher::new("src/{a,b").is_err());
    /// ```
    pub fn new(pattern_str: &str) -> Result<Self> {
        if pattern_str.trim().is_empty() {
            anyhow::bail!("Glob pattern must not be empty");
        }

        let matcher = GlobBuilder::new(pattern_str)
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid glob pattern: {pattern_str}"))?
            .compile_matcher();

        Ok(Self {
            matcher,
            original_pattern: pattern_str.to_string(),
        })
    }

    /// Check a project-relative path, normalizing separators first.
    pub fn matches(&self, path: &Path) -> bool {
        self.matches_str(&to_slash(path))
    }

    /// Check an already normalized, forward-slash relative path.
    pub fn matches_str(&self, relative: &str) -> bool {
        self.matcher.is_match(relative)
    }

    /// The pattern exactly as written.
    pub fn pattern(&self) -> &str {
        &self.original_pattern
    }
}

/// The set of project files `applyTo` patterns are evaluated against.
///
/// Paths are project-relative, forward-slash separated and kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFiles {
    files: BTreeSet<String>,
}

impl ProjectFiles {
    /// Walk `root` and record every regular file outside ignored directories.
    ///
    /// A directory is ignored when its name equals one of `ignored_dirs`, at
    /// any depth. Symlinks are not followed. Entries that cannot be read are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Fails only if `root` itself cannot be read.
    pub fn scan(root: &Path, ignored_dirs: &[String]) -> Result<Self> {
        std::fs::read_dir(root)
            .with_context(|| format!("Failed to read project directory: {}", root.display()))?;

        let mut files = BTreeSet::new();
        let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !ignored_dirs.iter().any(|ignored| ignored.as_str() == name)
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry during project scan: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                trace!("Inventory: {}", relative.display());
                files.insert(to_slash(relative));
            }
        }

        debug!("Project inventory holds {} files", files.len());
        Ok(Self {
            files,
        })
    }

    /// Build an inventory from explicit relative paths.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            files: paths.into_iter().map(|p| to_slash(p.as_ref())).collect(),
        }
    }

    /// Drop one path, e.g. the compiled output, so it never influences matching.
    pub fn remove(&mut self, relative: &Path) -> bool {
        self.files.remove(&to_slash(relative))
    }

    /// Number of files in the inventory.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the inventory is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate the normalized relative paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Files matched by `matcher`, in sorted order.
    pub fn matching<'a>(&'a self, matcher: &'a PatternMatcher) -> impl Iterator<Item = &'a str> {
        self.iter().filter(move |file| matcher.matches_str(file))
    }
}

/// Whether a primitive scoped by `pattern` applies to the project.
///
/// `None` always applies. A pattern applies when at least one inventory file
/// matches it; a pattern that matches nothing simply does not apply.
///
/// # Examples
///
/// ```rust
/// use awd_cli::pattern::{PatternMatcher, ProjectFiles, matches};
///
/// let files = ProjectFiles::from_paths(["src/main.py", "README.md"]);
/// let py = PatternMatcher::new("**/*.py").unwrap();
/// let rs = PatternMatcher::new("**/*.rs").unwrap();
///
/// assert!(matches(None, &files));
/// assert!(matches(Some(&py), &files));
/// assert!(!matches(Some(&rs), &files));
/// ```
pub fn matches(pattern: Option<&PatternMatcher>, files: &ProjectFiles) -> bool {
    match pattern {
        None => true,
        Some(matcher) => files.matching(matcher).next().is_some(),
    }
}

/// Render a relative path with `/` separators, dropping `.` components.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
