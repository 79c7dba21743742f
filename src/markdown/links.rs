//! Inlining of local markdown links.
//!
//! Primitive bodies may reference other documents with ordinary inline links,
//! e.g. `[Architecture](../context/architecture.context.md)`. When link
//! resolution is enabled, each such link is replaced by the linked document's
//! content (frontmatter stripped) under a `#### <label>` sub-heading. Inlined
//! documents are themselves scanned, recursively.
//!
//! # Guarantees
//!
//! - Resolution never fails. Missing targets, cycles and links beyond
//!   [`MAX_LINK_DEPTH`] are left as the literal `[label](path)` text. A
//!   missing target is reported as missing even at the depth limit.
//! - A document is inlined at most once per resolution. The `seen` set starts
//!   with the resolving document itself, so self-links and `A -> B -> A`
//!   cycles terminate.
//! - Only relative links to `.md` / `.markdown` files are touched. URLs,
//!   `mailto:` links, in-page anchors, absolute paths, images and links inside
//!   fenced code blocks pass through unchanged.
//!
//! File access goes through [`DocumentSource`] so cycle and depth behavior can
//! be tested with in-memory documents.

use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::constants::MAX_LINK_DEPTH;
use crate::markdown::frontmatter::FrontmatterParser;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]]*)\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#)
        .expect("link pattern is a valid regex")
});

/// Read access to documents referenced by links.
pub trait DocumentSource {
    /// Return the content at `path`, or `None` if it does not exist or cannot be read.
    fn read(&self, path: &Path) -> Option<String>;
}

/// Reads linked documents from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl DocumentSource for FsSource {
    fn read(&self, path: &Path) -> Option<String> {
        if !path.is_file() {
            return None;
        }
        std::fs::read_to_string(path).ok()
    }
}

impl<F> DocumentSource for F
where
    F: Fn(&Path) -> Option<String>,
{
    fn read(&self, path: &Path) -> Option<String> {
        self(path)
    }
}

/// Why a link was left as literal text.
///
/// Links back to an already inlined document produce no warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkWarning {
    /// The link target does not exist.
    Missing {
        /// Document containing the link
        source: PathBuf,
        /// Link target as written
        target: String,
    },
    /// The link sits deeper than [`MAX_LINK_DEPTH`] levels of inlining.
    DepthExceeded {
        /// Document containing the link
        source: PathBuf,
        /// Link target as written
        target: String,
    },
}

impl std::fmt::Display for LinkWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing {
                source,
                target,
            } => write!(f, "{}: link target not found: {target}", source.display()),
            Self::DepthExceeded {
                source,
                target,
            } => write!(f, "{}: link nesting limit reached: {target}", source.display()),
        }
    }
}

/// Result of resolving one body of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedText {
    /// Text with every resolvable link inlined.
    pub text: String,
    /// Links left untouched for a reportable reason.
    pub warnings: Vec<LinkWarning>,
}

/// Recursive link inliner over a [`DocumentSource`].
pub struct LinkResolver<S> {
    source: S,
    max_depth: usize,
    frontmatter: FrontmatterParser,
}

impl LinkResolver<FsSource> {
    /// Resolver reading from the local file system.
    pub fn from_fs() -> Self {
        Self::new(FsSource)
    }
}

impl<S: DocumentSource> LinkResolver<S> {
    /// Create a resolver with the default depth limit.
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_depth: MAX_LINK_DEPTH,
            frontmatter: FrontmatterParser::new(),
        }
    }

    /// Override the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Inline local markdown links found in `body`.
    ///
    /// `source_path` is the file `body` came from; relative link targets are
    /// resolved against its parent directory. `source_path` is added to `seen`
    /// before scanning. Paths already in `seen` are never inlined again, and
    /// every inlined path is added to it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use awd_cli::markdown::links::LinkResolver;
    /// use std::collections::HashSet;
    /// use std::path::Path;
    ///
    /// let source = |path: &Path| {
    ///     (path == Path::new("/p/guide.md")).then(|| "Guide text".to_string())
    /// };
    /// let resolver = LinkResolver::new(source);
    /// let mut seen = HashSet::new();
    /// let out = resolver.resolve_links("See [Guide](guide.md).", Path::new("/p/a.md"), &mut seen);
    ///
    /// assert!(out.text.contains("#### Guide"));
    /// assert!(out.text.contains("Guide text"));
    /// assert!(out.warnings.is_empty());
    /// ```
    pub fn resolve_links(
        &self,
        body: &str,
        source_path: &Path,
        seen: &mut HashSet<PathBuf>,
    ) -> ResolvedText {
        let source_path = normalize(source_path);
        seen.insert(source_path.clone());

        let mut warnings = Vec::new();
        let text = self.resolve_at_depth(body, &source_path, seen, 0, &mut warnings);
        ResolvedText {
            text,
            warnings,
        }
    }

    fn resolve_at_depth(
        &self,
        body: &str,
        source_path: &Path,
        seen: &mut HashSet<PathBuf>,
        depth: usize,
        warnings: &mut Vec<LinkWarning>,
    ) -> String {
        let mut output = String::with_capacity(body.len());
        let mut prose = String::new();
        let mut fence: Option<&str> = None;

        for line in body.split_inclusive('\n') {
            let marker = fence_marker(line);
            match (fence, marker) {
                (None, Some(open)) => {
                    output.push_str(&self.resolve_prose(&prose, source_path, seen, depth, warnings));
                    prose.clear();
                    output.push_str(line);
                    fence = Some(open);
                }
                (Some(open), Some(close)) if open == close && is_bare_fence(line, open) => {
                    output.push_str(line);
                    fence = None;
                }
                (Some(_), _) => output.push_str(line),
                (None, None) => prose.push_str(line),
            }
        }
        output.push_str(&self.resolve_prose(&prose, source_path, seen, depth, warnings));
        output
    }

    /// Replace links in a chunk of text known to be outside code fences.
    fn resolve_prose(
        &self,
        text: &str,
        source_path: &Path,
        seen: &mut HashSet<PathBuf>,
        depth: usize,
        warnings: &mut Vec<LinkWarning>,
    ) -> String {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for caps in LINK_PATTERN.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let is_image = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let label = caps.get(2).map_or("", |m| m.as_str());
            let target = caps.get(3).map_or("", |m| m.as_str());

            output.push_str(&text[last..whole.start()]);
            last = whole.end();

            if is_image || !is_local_markdown(target) {
                output.push_str(whole.as_str());
                continue;
            }

            let resolved_path = resolve_target(source_path, target);

            if seen.contains(&resolved_path) {
                debug!("Skipping already inlined link {} in {}", target, source_path.display());
                output.push_str(whole.as_str());
                continue;
            }

            let Some(content) = self.source.read(&resolved_path) else {
                warnings.push(LinkWarning::Missing {
                    source: source_path.to_path_buf(),
                    target: target.to_string(),
                });
                output.push_str(whole.as_str());
                continue;
            };

            if depth >= self.max_depth {
                warnings.push(LinkWarning::DepthExceeded {
                    source: source_path.to_path_buf(),
                    target: target.to_string(),
                });
                output.push_str(whole.as_str());
                continue;
            }

            debug!("Inlining {} into {}", resolved_path.display(), source_path.display());
            seen.insert(resolved_path.clone());

            let content = self.frontmatter.strip_frontmatter(&content);
            let nested = self.resolve_at_depth(&content, &resolved_path, seen, depth + 1, warnings);
            let heading = if label.trim().is_empty() {
                link_stem(&resolved_path)
            } else {
                label.trim().to_string()
            };

            output.push_str(&format!("\n\n#### {heading}\n\n{}\n\n", nested.trim()));
        }

        output.push_str(&text[last..]);
        output
    }
}

/// Return the fence string (` ``` ` or `~~~`) if `line` opens or closes a fenced block.
fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// A closing fence carries no info string.
fn is_bare_fence(line: &str, marker: &str) -> bool {
    let fence_char = if marker.starts_with('`') { '`' } else { '~' };
    line.trim().trim_start_matches(fence_char).is_empty()
}

fn is_local_markdown(target: &str) -> bool {
    if target.contains("://")
        || target.starts_with("mailto:")
        || target.starts_with('#')
        || target.starts_with('/')
        || Path::new(target).is_absolute()
    {
        return false;
    }

    let path = strip_anchor(target).to_ascii_lowercase();
    path.ends_with(".md") || path.ends_with(".markdown")
}

fn strip_anchor(target: &str) -> &str {
    target.split(['#', '?']).next().unwrap_or(target)
}

fn resolve_target(source_path: &Path, target: &str) -> PathBuf {
    let base = source_path.parent().unwrap_or_else(|| Path::new(""));
    normalize(&base.join(strip_anchor(target)))
}

fn link_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.split('.').next().unwrap_or(stem).to_string())
        .unwrap_or_default()
}

/// Lexically normalize a path: drop `.` components and fold `..` into the parent.
///
/// Does not touch the file system, so it works for documents that do not
/// exist and for in-memory sources.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn docs(entries: &[(&str, &str)]) -> impl Fn(&Path) -> Option<String> {
        let map: HashMap<PathBuf, String> =
            entries.iter().map(|(path, content)| (PathBuf::from(path), content.to_string())).collect();
        move |path: &Path| map.get(path).cloned()
    }

    fn resolve(source: impl DocumentSource, body: &str, from: &str) -> ResolvedText {
        let resolver = LinkResolver::new(source);
        let mut seen = HashSet::new();
        resolver.resolve_links(body, Path::new(from), &mut seen)
    }

    #[test]
    fn test_inlines_relative_link_under_heading() {
        let source = docs(&[("/p/.awd/context/arch.context.md", "---\ntitle: x\n---\n\nLayers.\n")]);
        let out = resolve(
            source,
            "Read [Architecture](../context/arch.context.md) first.",
            "/p/.awd/instructions/a.instructions.md",
        );

        assert_eq!(out.text, "Read \n\n#### Architecture\n\nLayers.\n\n first.");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_missing_link_left_untouched_with_warning() {
        let out = resolve(docs(&[]), "See [Gone](nonexistent.md).", "/p/a.md");

        assert_eq!(out.text, "See [Gone](nonexistent.md).");
        assert_eq!(
            out.warnings,
            vec![LinkWarning::Missing {
                source: PathBuf::from("/p/a.md"),
                target: "nonexistent.md".to_string(),
            }]
        );
        assert!(out.warnings[0].to_string().contains("nonexistent.md"));
    }

    #[test]
    fn test_cycle_terminates_with_single_copies() {
        let source = docs(&[
            ("/p/a.md", "A body [to B](b.md)"),
            ("/p/b.md", "B body [back to A](a.md)"),
        ]);
        let out = resolve(source, "A body [to B](b.md)", "/p/a.md");

        assert_eq!(out.text.matches("A body").count(), 1);
        assert_eq!(out.text.matches("B body").count(), 1);
        assert!(out.text.contains("[back to A](a.md)"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_self_link_is_noop() {
        let source = docs(&[("/p/a.md", "loop [me](./a.md)")]);
        let out = resolve(source, "loop [me](./a.md)", "/p/a.md");

        assert_eq!(out.text, "loop [me](./a.md)");
    }

    #[test]
    fn test_same_target_inlined_once() {
        let source = docs(&[("/p/g.md", "Guide")]);
        let out = resolve(source, "[one](g.md) and [two](g.md)", "/p/a.md");

        assert_eq!(out.text.matches("Guide").count(), 1);
        assert!(out.text.ends_with("and [two](g.md)"));
    }

    #[test]
    fn test_depth_limit_leaves_link_and_warns() {
        let source = docs(&[("/p/1.md", "one [n](2.md)"), ("/p/2.md", "two [n](3.md)"), ("/p/3.md", "three")]);
        let resolver = LinkResolver::new(source).with_max_depth(2);
        let mut seen = HashSet::new();
        let out = resolver.resolve_links("root [n](1.md)", Path::new("/p/0.md"), &mut seen);

        assert!(out.text.contains("one"));
        assert!(out.text.contains("two"));
        assert!(!out.text.contains("three"));
        assert!(out.text.contains("[n](3.md)"));
        assert!(matches!(out.warnings.as_slice(), [LinkWarning::DepthExceeded { .. }]));
    }

    #[test]
    fn test_default_depth_is_bounded() {
        // An unbounded chain of distinct documents 0.md -> 1.md -> ...
        let source = |path: &Path| {
            let n: usize = path.file_stem()?.to_str()?.parse().ok()?;
            Some(format!("level{n} [next]({}.md)", n + 1))
        };
        let out = resolve(source, "[start](0.md)", "/p/root.md");

        assert_eq!(out.text.matches("level").count(), MAX_LINK_DEPTH);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_urls_anchors_images_and_non_markdown_untouched() {
        let body = "[site](https://example.com/x.md) [sec](#section) ![img](pic.md) [txt](notes.txt) [mail](mailto:a@b.md) [abs](/etc/x.md)";
        let source = |_: &Path| Some("SHOULD NOT APPEAR".to_string());
        let out = resolve(source, body, "/p/a.md");

        assert_eq!(out.text, body);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_links_in_fenced_code_untouched() {
        let source = docs(&[("/p/g.md", "Guide")]);
        let body = "```md\n[g](g.md)\n```\nafter [g](g.md)\n";
        let out = resolve(source, body, "/p/a.md");

        assert!(out.text.starts_with("```md\n[g](g.md)\n```\n"));
        assert!(out.text.contains("#### g\n\nGuide"));
    }

    #[test]
    fn test_info_string_line_does_not_close_fence() {
        let source = docs(&[("/p/g.md", "Guide")]);
        let body = "```
```rust
[g](g.md)
```
";
        let out = resolve(source, body, "/p/a.md");

        assert_eq!(out.text, body);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_tilde_fence_closes_on_longer_run() {
        let source = docs(&[("/p/g.md", "Guide")]);
        let out = resolve(source, "~~~
[g](g.md)
~~~~
[g](g.md)
", "/p/a.md");

        assert!(out.text.starts_with("~~~
[g](g.md)
~~~~
"));
        assert!(out.text.contains("#### g

Guide"));
    }

    #[test]
    fn test_missing_target_at_depth_limit_reports_missing() {
        let source = docs(&[("/p/1.md", "one [gone](nope.md)")]);
        let resolver = LinkResolver::new(source).with_max_depth(1);
        let mut seen = HashSet::new();
        let out = resolver.resolve_links("root [n](1.md)", Path::new("/p/0.md"), &mut seen);

        assert!(out.text.contains("[gone](nope.md)"));
        assert_eq!(
            out.warnings,
            vec![LinkWarning::Missing {
                source: PathBuf::from("/p/1.md"),
                target: "nope.md".to_string(),
            }]
        );
    }

    #[test]
    fn test_anchor_suffix_resolves_file() {
        let source = docs(&[("/p/guide.md", "Guide")]);
        let out = resolve(source, "[Setup](guide.md#setup)", "/p/a.md");

        assert!(out.text.contains("#### Setup\n\nGuide"));
    }

    #[test]
    fn test_empty_label_uses_file_stem() {
        let source = docs(&[("/p/arch.context.md", "Layers")]);
        let out = resolve(source, "[](arch.context.md)", "/p/a.md");

        assert!(out.text.contains("#### arch\n"));
    }

    #[test]
    fn test_nested_links_resolve_relative_to_linked_file() {
        let source = docs(&[("/p/docs/a.md", "A [b](sub/b.md)"), ("/p/docs/sub/b.md", "B")]);
        let out = resolve(source, "[a](docs/a.md)", "/p/root.md");

        assert!(out.text.contains("#### a"));
        assert!(out.text.contains("#### b\n\nB"));
    }

    #[test]
    fn test_fs_source_reads_files() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("guide.md"), "From disk").unwrap();

        let resolver = LinkResolver::from_fs();
        let mut seen = HashSet::new();
        let out = resolver.resolve_links("[g](guide.md)", &temp.path().join("a.md"), &mut seen);

        assert!(out.text.contains("From disk"));
        assert!(FsSource.read(temp.path()).is_none());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d.md")), PathBuf::from("/a/c/d.md"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
    }
}
