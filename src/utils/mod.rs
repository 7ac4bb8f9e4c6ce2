//! Cross-platform utility functions shared by the rest of the crate.

pub mod fs;

pub use fs::{atomic_write, calculate_checksum, ensure_dir};
