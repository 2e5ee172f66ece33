//! Local git repository access
//!
//! A thin wrapper around git2 that exposes exactly what remote
//! resolution needs: the set of configured remotes, each with its URL and
//! the out-of-band `bb-resolved` hint.

use std::path::Path;

use git2::Repository;

#[cfg(test)]
use mockall::automock;

use crate::error::{BbError, Result};

/// Git config key (under `remote.<name>.`) carrying a resolution hint.
///
/// Empty or absent means no opinion, `"base"` marks the remote as the
/// base repository, and any other value is a `workspace/slug` alias the
/// remote points at.
const RESOLVED_CONFIG_KEY: &str = "bb-resolved";

/// One git remote as reported by the local repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRemote {
    pub name: String,
    pub url: String,
    pub resolved: String,
}

/// Source of git remotes, read fresh on each call.
///
/// Trait seam so the resolver can be exercised without a working tree.
#[cfg_attr(test, automock)]
pub trait RemoteSource {
    fn remotes(&self) -> Result<Vec<GitRemote>>;
}

/// Wrapper for local git repository operations
pub struct GitRepository {
    repo: Repository,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository").finish_non_exhaustive()
    }
}

impl GitRepository {
    /// Open the git repository in the current directory
    pub fn open_current_dir() -> Result<Self> {
        Self::discover(".")
    }

    /// Discover a git repository from the given path
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| BbError::NotGitRepository)?;
        Ok(Self { repo })
    }
}

impl RemoteSource for GitRepository {
    fn remotes(&self) -> Result<Vec<GitRemote>> {
        let names = self.repo.remotes()?;
        let config = self.repo.config()?;

        let mut remotes = Vec::new();
        for name in names.iter().flatten() {
            let remote = self.repo.find_remote(name)?;
            // Remotes without a fetch URL cannot be resolved; skip them.
            let Some(url) = remote.url() else { continue };

            let resolved = config
                .get_string(&format!("remote.{name}.{RESOLVED_CONFIG_KEY}"))
                .unwrap_or_default();

            remotes.push(GitRemote {
                name: name.to_string(),
                url: url.to_string(),
                resolved,
            });
        }
        Ok(remotes)
    }
}
