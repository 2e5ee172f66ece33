//! bb - Bitbucket Cloud from the command line
//!
//! Library surface backing the `bb` binary:
//! - `core`: hostname normalization, repository identity, git remote
//!   reading, authentication config, and remote resolution
//! - `api`: the HTTP transport interceptor chain and REST helper
//! - `cli`: command definitions and handlers

pub mod api;
pub mod cli;
pub mod core;
pub mod error;

pub use error::{BbError, Result};
