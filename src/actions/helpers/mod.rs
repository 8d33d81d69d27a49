//! Shared helpers for action implementations.
pub mod fs;
