//! Parsing a single primitive file.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::{Primitive, PrimitiveKind, PrimitiveMetadata};
use crate::markdown::frontmatter::{FrontmatterError, FrontmatterParser};
use crate::pattern::PatternMatcher;

/// Why a single file could not become a [`Primitive`].
///
/// Parse errors are per-file and never abort discovery; they are collected
/// into [`super::PrimitiveCollection::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The file could not be read (permissions, invalid UTF-8, vanished mid-scan).
    #[error("cannot read file: {0}")]
    Unreadable(String),

    /// The frontmatter block is unclosed, not YAML, or not a key/value mapping.
    #[error("malformed frontmatter: {0}")]
    MalformedFrontmatter(String),

    /// A field required for this kind is absent or blank.
    #[error("missing required field '{0}'")]
    MissingRequiredField(String),

    /// A field is present but unusable, e.g. an `applyTo` that is not a valid glob.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Frontmatter key
        field: String,
        /// What is wrong with the value
        reason: String,
    },

    /// The file name carries no recognized kind suffix.
    #[error("unrecognized primitive file name: {0}")]
    UnknownKind(String),
}

const DESCRIPTION: &str = "description";
const APPLY_TO: &str = "applyTo";
const BODY: &str = "body";

/// Parse the raw text of a primitive file.
///
/// The kind and name come from `source_path`; the text is split into
/// frontmatter and body, then checked against the required fields of that kind:
///
/// | Kind        | Required                          |
/// |-------------|-----------------------------------|
/// | Chatmode    | `description`, non-empty body     |
/// | Instruction | `description`, `applyTo`, body    |
/// | Context     | non-empty body                    |
/// | Spec        | non-empty body                    |
/// | Workflow    | non-empty body                    |
///
/// An `applyTo` on a context, spec or workflow is ignored for compilation and
/// kept in [`PrimitiveMetadata::extra`].
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first problem found.
///
/// # Examples
///
/// ```rust
/// use awd_cli::primitives::{ParseError, parse_primitive};
/// use std::path::Path;
///
/// let raw = "---\ndescription: Python rules\napplyTo: \"**/*.py\"\n---\nUse type hints.\n";
/// let primitive = parse_primitive(raw, Path::new("python.instructions.md")).unwrap();
/// assert_eq!(primitive.name, "python");
/// assert_eq!(primitive.apply_to.as_deref(), Some("**/*.py"));
///
/// let missing = "---\ndescription: No scope\n---\nBody\n";
/// assert_eq!(
///     parse_primitive(missing, Path::new("bad.instructions.md")),
///     Err(ParseError::MissingRequiredField("applyTo".to_string()))
/// );
/// ```
pub fn parse_primitive(raw: &str, source_path: &Path) -> Result<Primitive, ParseError> {
    let kind = PrimitiveKind::from_path(source_path)
        .ok_or_else(|| ParseError::UnknownKind(source_path.display().to_string()))?;
    let name = PrimitiveKind::primitive_name(source_path)
        .ok_or_else(|| ParseError::UnknownKind(source_path.display().to_string()))?;

    let document = FrontmatterParser::new().split(raw).map_err(|e| match e {
        FrontmatterError::Unclosed => ParseError::MalformedFrontmatter(e.to_string()),
    })?;

    let mut fields = match document.frontmatter.as_deref() {
        Some(text) => parse_mapping(text)?,
        None => Mapping::new(),
    };

    let description = take_string(&mut fields, DESCRIPTION)?.filter(|d| !d.trim().is_empty());
    let raw_apply_to = take_string(&mut fields, APPLY_TO)?;

    let apply_to = match kind {
        PrimitiveKind::Instruction => {
            require(&description, DESCRIPTION)?;
            let pattern = raw_apply_to
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| ParseError::MissingRequiredField(APPLY_TO.to_string()))?;
            validate_glob(&pattern)?;
            Some(pattern)
        }
        PrimitiveKind::Chatmode => {
            require(&description, DESCRIPTION)?;
            match raw_apply_to {
                Some(pattern) if pattern.trim().is_empty() => {
                    return Err(ParseError::InvalidField {
                        field: APPLY_TO.to_string(),
                        reason: "must be a non-empty glob pattern; omit it to apply globally".to_string(),
                    });
                }
                Some(pattern) => {
                    validate_glob(&pattern)?;
                    Some(pattern)
                }
                None => None,
            }
        }
        PrimitiveKind::Context | PrimitiveKind::Spec | PrimitiveKind::Workflow => {
            if let Some(pattern) = raw_apply_to {
                fields.insert(Value::String(APPLY_TO.to_string()), Value::String(pattern));
            }
            None
        }
    };

    if document.body.trim().is_empty() {
        return Err(ParseError::MissingRequiredField(BODY.to_string()));
    }

    let metadata = PrimitiveMetadata {
        author: take_string(&mut fields, "author")?,
        version: take_string(&mut fields, "version")?,
        mcp: take_string_list(&mut fields, "mcp")?,
        input: take_string_list(&mut fields, "input")?,
        extra: into_extra(fields)?,
    };

    Ok(Primitive {
        kind,
        name,
        description,
        apply_to,
        body: document.body,
        source_path: source_path.to_path_buf(),
        metadata,
    })
}

fn parse_mapping(text: &str) -> Result<Mapping, ParseError> {
    match serde_yaml::from_str::<Value>(text) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(ParseError::MalformedFrontmatter(
            "expected 'key: value' pairs".to_string(),
        )),
        Err(e) => Err(ParseError::MalformedFrontmatter(e.to_string())),
    }
}

fn require(value: &Option<String>, field: &str) -> Result<(), ParseError> {
    match value {
        Some(_) => Ok(()),
        None => Err(ParseError::MissingRequiredField(field.to_string())),
    }
}

fn validate_glob(pattern: &str) -> Result<(), ParseError> {
    PatternMatcher::new(pattern).map(|_| ()).map_err(|e| ParseError::InvalidField {
        field: APPLY_TO.to_string(),
        reason: format!("{e:#}"),
    })
}

/// Remove `key` and coerce scalars (strings, numbers, booleans) to a string.
fn take_string(fields: &mut Mapping, key: &str) -> Result<Option<String>, ParseError> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(&value).map(Some).ok_or_else(|| ParseError::InvalidField {
            field: key.to_string(),
            reason: "expected a string".to_string(),
        }),
    }
}

/// Remove `key` and read it as a list of strings. A single scalar becomes a one-item list.
fn take_string_list(fields: &mut Mapping, key: &str) -> Result<Vec<String>, ParseError> {
    let invalid = || ParseError::InvalidField {
        field: key.to_string(),
        reason: "expected a list of strings".to_string(),
    };

    match fields.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => {
            items.iter().map(|item| scalar_to_string(item).ok_or_else(invalid)).collect()
        }
        Some(value) => scalar_to_string(&value).map(|s| vec![s]).ok_or_else(invalid),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn into_extra(fields: Mapping) -> Result<BTreeMap<String, serde_json::Value>, ParseError> {
    let mut extra = BTreeMap::new();
    for (key, value) in fields {
        let key = scalar_to_string(&key).ok_or_else(|| {
            ParseError::MalformedFrontmatter("frontmatter keys must be strings".to_string())
        })?;
        let value = serde_json::to_value(&value).map_err(|e| ParseError::InvalidField {
            field: key.clone(),
            reason: e.to_string(),
        })?;
        extra.insert(key, value);
    }
    Ok(extra)
}
