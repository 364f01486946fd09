//! # pkdx Common Library
//!
//! Shared code for the pkdx services including:
//! - Error types
//! - TOML configuration loading and layered resolution
//! - Logging bootstrap

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
