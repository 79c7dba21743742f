//! Test utilities for AWD
//!
//! Helpers for unit and integration tests: logging setup and temporary
//! project fixtures populated with primitive files.
//!
//! # Example
//!
//! ```rust,no_run
//! use awd_cli::test_utils::ProjectFixture;
//!
//! let project = ProjectFixture::new();
//! project.write_chatmode(".awd/default.chatmode.md", None, "You are a helpful engineer.");
//! project.write_instruction(".awd/python.instructions.md", "**/*.py", "Use type hints.");
//! assert!(project.path().join(".awd").is_dir());
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging once per process.
///
/// With `Some(level)` that level is used; otherwise `RUST_LOG` is honored when
/// set, and logging stays off when it is not.
///
/// ```bash
/// RUST_LOG=awd_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// A temporary project directory that is removed on drop.
///
/// Writers panic on I/O failure; they are meant for tests only.
pub struct ProjectFixture {
    temp_dir: TempDir,
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFixture {
    /// Create an empty project.
    pub fn new() -> Self {
        init_test_logging(None);
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a project-relative file.
    pub fn join(&self, relative: &str) -> PathBuf {
        self.path().join(relative)
    }

    /// Write `content` to a project-relative path, creating parent directories.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Write a chatmode with a generated description.
    pub fn write_chatmode(&self, relative: &str, apply_to: Option<&str>, body: &str) -> PathBuf {
        let scope = apply_to.map(|p| format!("applyTo: \"{p}\"\n")).unwrap_or_default();
        self.write(relative, format!("---\ndescription: Chatmode for tests\n{scope}---\n\n{body}\n"))
    }

    /// Write an instruction with a generated description.
    pub fn write_instruction(&self, relative: &str, apply_to: &str, body: &str) -> PathBuf {
        self.write(
            relative,
            format!("---\ndescription: Instruction for tests\napplyTo: \"{apply_to}\"\n---\n\n{body}\n"),
        )
    }

    /// Read a project-relative file.
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.join(relative)).expect("read fixture file")
    }

    /// Whether a project-relative file exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.join(relative).exists()
    }
}

/// Drop the `Generated on:` header line so documents from different runs compare equal.
pub fn without_timestamp(document: &str) -> String {
    document.lines().filter(|line| !line.starts_with("<!-- Generated on:")).collect::<Vec<_>>().join("\n")
}
