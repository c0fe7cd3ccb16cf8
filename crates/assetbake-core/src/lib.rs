//! assetbake Core Library
//!
//! This crate provides the error taxonomy and the small math types
//! shared across all assetbake components.

pub mod error;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;
