//! Project configuration (`awd.toml`).
//!
//! The file is optional and lives at the project root. Every key is optional;
//! command-line flags override it and built-in defaults fill the gaps.
//!
//! ```toml
//! [compile]
//! output = "AGENTS.md"
//! chatmode = "default"
//! resolve_links = true
//! skip_unmatched_patterns = false
//! debounce_ms = 1000
//! ignore = [".git", "node_modules", "target"]
//! ```
//!
//! Unknown keys are rejected so typos surface as errors instead of being
//! silently ignored.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::compiler::CompileOptions;
use crate::constants::{CONFIG_FILE, DEFAULT_DEBOUNCE};
use crate::core::AwdError;

/// Contents of `awd.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// `[compile]` table.
    #[serde(default)]
    pub compile: CompileConfig,
}

/// The `[compile]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileConfig {
    /// Output path, relative to the project root.
    pub output: Option<PathBuf>,
    /// Chatmode to include when `--chatmode` is not given.
    pub chatmode: Option<String>,
    /// Inline local markdown links.
    pub resolve_links: Option<bool>,
    /// Omit instruction groups whose pattern matches no project file.
    pub skip_unmatched_patterns: Option<bool>,
    /// Watch-mode quiet period in milliseconds.
    pub debounce_ms: Option<u64>,
    /// Directory names excluded from pattern matching. Replaces the default list.
    pub ignore: Option<Vec<String>>,
}

/// Compile flags given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOverrides {
    /// `--output`
    pub output: Option<PathBuf>,
    /// `--chatmode`
    pub chatmode: Option<String>,
    /// `--no-links` maps to `Some(false)`
    pub resolve_links: Option<bool>,
    /// `--skip-unmatched` maps to `Some(true)`
    pub skip_unmatched: Option<bool>,
    /// `--dry-run`
    pub dry_run: bool,
    /// `--validate`
    pub validate_only: bool,
}

impl ProjectConfig {
    /// Load `awd.toml` from `project_root`.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// [`AwdError::ConfigParseError`] when the file exists but cannot be read
    /// or is not valid configuration.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        if !path.exists() {
            debug!("No {} found, using defaults", CONFIG_FILE);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| AwdError::ConfigParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::parse(&content).map_err(|reason| AwdError::ConfigParseError {
            file: path.display().to_string(),
            reason,
        })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text.
    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.message().to_string())
    }

    /// Watch-mode quiet period.
    pub fn debounce(&self) -> Duration {
        self.compile.debounce_ms.map_or(DEFAULT_DEBOUNCE, Duration::from_millis)
    }

    /// Build compile options: command line first, then this file, then defaults.
    pub fn compile_options(&self, overrides: &CompileOverrides) -> CompileOptions {
        let defaults = CompileOptions::default();
        let file = &self.compile;

        CompileOptions {
            output_path: overrides.output.clone().or_else(|| file.output.clone()).unwrap_or(defaults.output_path),
            chatmode: overrides.chatmode.clone().or_else(|| file.chatmode.clone()),
            resolve_links: overrides.resolve_links.or(file.resolve_links).unwrap_or(defaults.resolve_links),
            dry_run: overrides.dry_run,
            validate_only: overrides.validate_only,
            skip_unmatched: overrides
                .skip_unmatched
                .or(file.skip_unmatched_patterns)
                .unwrap_or(defaults.skip_unmatched),
            ignored_dirs: file.ignore.clone().unwrap_or(defaults.ignored_dirs),
        }
    }
}
