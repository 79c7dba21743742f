//! Constants shared across the AWD codebase.
//!
//! Directory names, default file names and limits used by discovery,
//! link resolution and watch mode live here so they are discoverable in
//! one place.

use std::time::Duration;

/// Primary convention directory holding primitives.
pub const PRIMARY_DIR: &str = ".awd";

/// Secondary directory scanned for VSCode-style primitives.
pub const COMPAT_DIR: &str = ".github";

/// Directories scanned recursively for primitives, relative to the project root.
///
/// Order matters: files are sorted by depth, then directory, then name, so
/// this list only influences which trees are walked, not output order.
pub const DISCOVERY_DIRS: &[&str] = &[PRIMARY_DIR, COMPAT_DIR];

/// Default output path of the compiled document, relative to the project root.
pub const DEFAULT_OUTPUT: &str = "AGENTS.md";

/// Optional project configuration file at the project root.
pub const CONFIG_FILE: &str = "awd.toml";

/// Maximum nesting of inlined markdown links.
///
/// A link found at this depth is left as literal text and reported as a warning.
pub const MAX_LINK_DEPTH: usize = 5;

/// Default quiet period before watch mode recompiles.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Directories excluded from the project file inventory used for `applyTo` matching.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
];
