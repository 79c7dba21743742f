//! Error handling for AWD
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`AwdError`]) for failures that abort a command
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions for CLI users
//!
//! # What is *not* an error
//!
//! Per-file parse problems are collected as [`crate::primitives::ParseError`]
//! values inside the discovered collection and never abort a run. Broken or cyclic
//! markdown links degrade to literal text. Neither shows up here.
//!
//! # Fatal errors
//!
//! - [`AwdError::ChatmodeNotFound`] - an explicitly requested chatmode does not exist
//! - [`AwdError::ProjectRootUnreadable`] - the project root cannot be listed
//! - [`AwdError::OutputWriteFailed`] - the compiled document cannot be written
//! - [`AwdError::ValidationFailed`] - `--validate` found invalid primitives
//! - [`AwdError::ConfigParseError`] - `awd.toml` is malformed
//! - [`AwdError::WatchError`] - the file-system watcher could not be started
//!
//! Use [`user_friendly_error`] to turn any `anyhow::Error` into an [`ErrorContext`]
//! for display.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Fatal errors surfaced to the CLI layer.
#[derive(Error, Debug, Clone)]
pub enum AwdError {
    /// A chatmode was requested by name and no valid chatmode has that name.
    ///
    /// # Fields
    /// - `name`: The requested chatmode name
    /// - `available`: Names of all valid chatmodes that were discovered
    #[error("Chatmode '{name}' not found")]
    ChatmodeNotFound {
        /// The requested chatmode name
        name: String,
        /// Names of the chatmodes that do exist
        available: Vec<String>,
    },

    /// The project root does not exist or cannot be listed.
    #[error("Cannot read project root: {path}")]
    ProjectRootUnreadable {
        /// The project root that was requested
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// Writing the compiled document failed.
    #[error("Failed to write output file: {path}")]
    OutputWriteFailed {
        /// Destination path
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// Validation found invalid primitive files.
    #[error("Validation failed: {count} invalid primitive file(s)")]
    ValidationFailed {
        /// Number of files that failed to parse
        count: usize,
    },

    /// `awd.toml` could not be parsed.
    #[error("Invalid configuration in {file}: {reason}")]
    ConfigParseError {
        /// Configuration file path
        file: String,
        /// Parser message
        reason: String,
    },

    /// An unknown primitive kind was given on the command line.
    #[error("Unknown primitive kind: {kind}")]
    InvalidPrimitiveKind {
        /// The unrecognized kind string
        kind: String,
    },

    /// The file-system watcher failed to start.
    #[error("File watcher error: {reason}")]
    WatchError {
        /// Watcher failure description
        reason: String,
    },

    /// Anything else, carried as a message.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// An [`AwdError`] with optional details and a suggestion for the user.
///
/// # Examples
///
/// ```rust,no_run
/// use awd_cli::core::{AwdError, ErrorContext};
///
/// let context = ErrorContext::new(AwdError::ValidationFailed { count: 2 })
///     .with_suggestion("Run 'awd validate' to see every failing file")
///     .with_details("Invalid primitives are skipped during compilation");
///
/// context.display(); // Prints colored error to stderr
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: AwdError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: AwdError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error. Displayed in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error. Displayed in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a helpful suggestion.
///
/// Known [`AwdError`] variants anywhere in the chain get tailored advice; common
/// I/O failures get generic advice; anything else is shown with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(awd_error) = error.chain().find_map(|e| e.downcast_ref::<AwdError>()) {
        return create_error_context(awd_error.clone());
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(AwdError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the project directory")
                .with_details(io_error.to_string());
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(AwdError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct")
                .with_details(io_error.to_string());
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(AwdError::Other {
        message,
    })
}

fn create_error_context(error: AwdError) -> ErrorContext {
    match &error {
        AwdError::ChatmodeNotFound { name, available } => {
            let details = if available.is_empty() {
                "No valid chatmodes were discovered in .awd/ or .github/".to_string()
            } else {
                format!("Available chatmodes: {}", available.join(", "))
            };
            let suggestion = match closest_name(name, available) {
                Some(candidate) => format!("Did you mean '{candidate}'?"),
                None => "Create a <name>.chatmode.md file with a 'description' field, or omit --chatmode".to_string(),
            };
            ErrorContext::new(error).with_details(details).with_suggestion(suggestion)
        }

        AwdError::ProjectRootUnreadable { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check the --root path, or run awd from inside the project directory")
        }

        AwdError::OutputWriteFailed { reason, .. } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check that the output directory exists and is writable, or pass a different --output")
        }

        AwdError::ValidationFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the files marked ✗ above. Instructions need 'description' and 'applyTo'; chatmodes need 'description'")
            .with_details("Invalid primitives are skipped during compilation"),

        AwdError::ConfigParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax of awd.toml. Supported keys live under the [compile] table"),

        AwdError::InvalidPrimitiveKind { .. } => ErrorContext::new(error)
            .with_suggestion("Valid kinds are: chatmode, instruction, context, spec, workflow"),

        AwdError::WatchError { .. } => ErrorContext::new(error)
            .with_suggestion("Some platforms limit the number of watched files. Try compiling without --watch")
            .with_details("Watch mode relies on native file-system notifications"),

        _ => ErrorContext::new(error),
    }
}

/// Return the candidate nearest to `name` by Levenshtein distance, if close enough to be a typo.
fn closest_name<'a>(name: &str, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
        .filter(|(distance, candidate)| *distance <= 3.max(candidate.len() / 3))
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.as_str())
}
