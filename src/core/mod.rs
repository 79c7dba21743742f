//! Core types shared by every AWD module.
//!
//! - [`error`] - [`AwdError`], [`ErrorContext`] and [`user_friendly_error`]
//! - `kind` - [`PrimitiveKind`], the closed set of primitive kinds

pub mod error;
mod kind;

pub use error::{AwdError, ErrorContext, user_friendly_error};
pub use kind::PrimitiveKind;
