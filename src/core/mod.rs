//! Core functionality for bb
//!
//! This module contains the shared business logic:
//! - Hostname normalization and API base URLs
//! - Repository identity parsing and formatting
//! - Git remote access
//! - Authentication configuration
//! - Remote resolution and base repository selection

pub mod config;
pub mod git;
pub mod hosts;
pub mod repository;
pub mod resolver;

pub use config::AuthConfig;
pub use git::GitRepository;
pub use hosts::Instance;
pub use repository::RepoIdentity;
pub use resolver::{base_repo, resolve_base_repo, Remote, Resolver};
