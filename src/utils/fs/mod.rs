//! File system helpers.
//!
//! The compiled document must never be observed half-written, so every write
//! of generated output goes through [`atomic_write`].

mod atomic;

pub use atomic::{TEMP_SUFFIX, atomic_write, is_temp_file, safe_write};
