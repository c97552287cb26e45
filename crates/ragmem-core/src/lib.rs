//! # ragmem-core
//!
//! Memory record types, configuration, and utilities for RagMem.
//!
//! This crate provides the data contract shared by the RagMem crates:
//!
//! - **Types**: memory records, memory types, and their validation rules
//! - **Configuration**: loading and validation of the embedding and storage settings
//! - **Utilities**: path resolution, environment lookup, and secret handling

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, ValidationError};
pub use secret::SecretString;
pub use types::*;
