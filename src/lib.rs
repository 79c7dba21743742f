//! AWD CLI - Agent Workflow Development
//!
//! Compiles "agent primitives" (small markdown files with YAML frontmatter describing
//! chatmodes, instructions, context, specs and workflows) into a single `AGENTS.md`
//! document consumed by AI coding agents.
//!
//! # Architecture Overview
//!
//! A compilation is a pure function of the project tree at call time:
//!
//! ```text
//! project root ──► discovery ──► PrimitiveCollection ──► assembler ──► AGENTS.md
//!                      │                                   │
//!                 parse_primitive                 pattern matcher + link resolver
//! ```
//!
//! No state survives between invocations. Watch mode simply re-runs the full
//! pipeline behind a debounce state machine.
//!
//! # Core Modules
//!
//! - [`primitives`] - Primitive model, frontmatter parsing and discovery
//! - [`pattern`] - `applyTo` glob evaluation against the project file inventory
//! - [`markdown`] - Frontmatter splitting and local link inlining
//! - [`compiler`] - Section assembly, the compile facade and watch mode
//! - [`config`] - Optional `awd.toml` project configuration
//! - [`core`] - Error taxonomy and the [`core::PrimitiveKind`] enumeration
//! - [`cli`] - Command-line interface
//!
//! # Primitive File Conventions
//!
//! | Suffix              | Kind        | Required frontmatter         |
//! |---------------------|-------------|------------------------------|
//! | `.chatmode.md`      | Chatmode    | `description`                |
//! | `.instructions.md`  | Instruction | `description`, `applyTo`     |
//! | `.context.md`       | Context     | none                         |
//! | `.memory.md`        | Context     | none                         |
//! | `.spec.md`          | Spec        | none                         |
//! | `.prompt.md`        | Workflow    | none                         |
//!
//! Every kind requires a non-empty body.
//!
//! # Example
//!
//! ```rust,no_run
//! use awd_cli::compiler::{CompileOptions, compile};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let options = CompileOptions {
//!     dry_run: true,
//!     ..CompileOptions::default()
//! };
//! let result = compile(Path::new("."), &options)?;
//! if let Some(content) = &result.content {
//!     println!("{content}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod core;
pub mod markdown;
pub mod pattern;
pub mod primitives;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
