//! moodscope core
//!
//! Types and error handling shared across the moodscope crates.
//!
//! This crate provides:
//! - The three-way sentiment [`Label`]
//! - The externally-sourced [`Post`] record and its default-value accessors
//! - The workspace-wide [`Error`] type and [`Result`] alias

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Label, Post, User};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Label, Post, User};
}
