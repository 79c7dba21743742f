//! Supporting utilities.
//!
//! - [`fs`] - all-or-nothing file writes
//! - [`checksum`] - SHA-256 digests of generated content

pub mod checksum;
pub mod fs;
