//! Shared types, error definitions, and handle validation used across all
//! courier crates.

pub mod error;
pub mod handle;
pub mod types;

pub use {
    error::{Error, Result},
    handle::is_valid_handle,
    types::{ChatKind, UserIdentity},
};
