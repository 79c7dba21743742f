//! Common test utilities for AWD integration tests
//!
//! [`TestProject`] owns a temporary project directory and runs the `awd`
//! binary inside it with colors disabled and a clean environment.

// Not every helper is used by every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A temporary project directory.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
}

impl TestProject {
    /// Create an empty project.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        fs::create_dir_all(&project_dir)?;
        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    /// Project root.
    pub fn path(&self) -> &Path {
        &self.project_dir
    }

    /// Write a project-relative file, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.project_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Read a project-relative file.
    pub fn read_file(&self, relative: &str) -> Result<String> {
        let path = self.project_dir.join(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Whether a project-relative file exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.project_dir.join(relative).exists()
    }

    /// Write a chatmode primitive.
    pub fn add_chatmode(&self, name: &str, description: &str, body: &str) -> Result<PathBuf> {
        self.write_file(
            &format!(".awd/chatmodes/{name}.chatmode.md"),
            &format!("---\ndescription: {description}\n---\n\n{body}\n"),
        )
    }

    /// Write an instruction primitive.
    pub fn add_instruction(&self, name: &str, apply_to: &str, body: &str) -> Result<PathBuf> {
        self.write_file(
            &format!(".awd/instructions/{name}.instructions.md"),
            &format!("---\ndescription: {name} rules\napplyTo: \"{apply_to}\"\n---\n\n{body}\n"),
        )
    }

    /// The standard two-primitive project: one Python instruction and one global chatmode.
    pub fn with_default_primitives() -> Result<Self> {
        let project = Self::new()?;
        project.add_instruction("a", "**/*.py", "Use type hints.")?;
        project.add_chatmode("default", "Default engineering persona", "You are a helpful engineer.")?;
        Ok(project)
    }

    /// Run `awd` in the project directory.
    pub fn run_awd(&self, args: &[&str]) -> Result<CommandOutput> {
        let awd_binary = env!("CARGO_BIN_EXE_awd");
        let output = Command::new(awd_binary)
            .args(args)
            .current_dir(&self.project_dir)
            .env("NO_COLOR", "1")
            .env_remove("AWD_ROOT")
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to run awd command")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }

    /// An `assert_cmd` command for `awd`, preconfigured like [`Self::run_awd`].
    pub fn awd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("awd").expect("awd binary is built");
        cmd.current_dir(&self.project_dir).env("NO_COLOR", "1").env_remove("AWD_ROOT").env_remove("RUST_LOG");
        cmd
    }
}

/// Captured result of one `awd` run.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStdout: {}\nStderr: {}",
            self.code, self.stdout, self.stderr
        );
        self
    }

    /// Assert the command failed with exit code 1
    pub fn assert_failure(&self) -> &Self {
        assert_eq!(
            self.code,
            Some(1),
            "Expected exit code 1\nStdout: {}\nStderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    /// Assert stdout contains `expected`
    pub fn assert_stdout_contains(&self, expected: &str) -> &Self {
        assert!(
            self.stdout.contains(expected),
            "Expected stdout to contain '{}'\nStdout: {}",
            expected,
            self.stdout
        );
        self
    }

    /// Assert stderr contains `expected`
    pub fn assert_stderr_contains(&self, expected: &str) -> &Self {
        assert!(
            self.stderr.contains(expected),
            "Expected stderr to contain '{}'\nStderr: {}",
            expected,
            self.stderr
        );
        self
    }
}

pub use awd_cli::test_utils::without_timestamp;
