//! Repository identity
//!
//! A repository is identified by the (host, workspace, slug) triple. This
//! module handles parsing identities from user-supplied strings and git
//! remote URLs, and formatting them back out.

use std::fmt;

use url::Url;

use crate::core::hosts::{normalize_hostname, Instance};
use crate::error::{BbError, Result};

/// Identity of one repository on one host.
///
/// The host is always stored normalized (lower-cased, `www.` stripped);
/// equality is case-insensitive on workspace and slug. Immutable once
/// constructed.
#[derive(Debug, Clone, Eq)]
pub struct RepoIdentity {
    host: String,
    workspace: String,
    slug: String,
}

impl RepoIdentity {
    pub fn new(host: &str, workspace: &str, slug: &str) -> Self {
        Self {
            host: normalize_hostname(host),
            workspace: workspace.to_string(),
            slug: slug.to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Parse a user-supplied repository specifier.
    ///
    /// Accepts the short form `workspace/slug` (host defaults to the
    /// instance default), the host-qualified form `host/workspace/slug`,
    /// and full URL forms (see [`RepoIdentity::from_url`]).
    pub fn parse(spec: &str, instance: &Instance) -> Result<Self> {
        if spec.contains("://") || spec.starts_with("git@") {
            return Self::from_url(spec);
        }

        let parts: Vec<&str> = spec.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(BbError::InvalidRepository(spec.to_string()));
        }
        match parts.as_slice() {
            [workspace, slug] => Ok(Self::new(instance.default_host(), workspace, slug)),
            [host, workspace, slug] => Ok(Self::new(host, workspace, slug)),
            _ => Err(BbError::InvalidRepository(spec.to_string())),
        }
    }

    /// Parse a repository identity from a remote URL.
    ///
    /// Supports HTTPS, SSH-scheme, and SSH shorthand forms:
    /// - `https://host/workspace/slug.git`
    /// - `ssh://git@host/workspace/slug.git`
    /// - `git@host:workspace/slug.git`
    pub fn from_url(raw: &str) -> Result<Self> {
        // SSH shorthand: user@host:path
        if let Some(rest) = raw.strip_prefix("git@") {
            if let Some((host, path)) = rest.split_once(':') {
                return Self::from_host_path(host, path, raw);
            }
        }

        if let Ok(parsed) = Url::parse(raw) {
            if matches!(parsed.scheme(), "http" | "https" | "ssh") {
                if let Some(host) = parsed.host_str() {
                    return Self::from_host_path(host, parsed.path(), raw);
                }
            }
        }

        Err(BbError::InvalidRepository(raw.to_string()))
    }

    fn from_host_path(host: &str, path: &str, raw: &str) -> Result<Self> {
        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        match parts.as_slice() {
            [workspace, slug] => Ok(Self::new(host, workspace, slug)),
            _ => Err(BbError::InvalidRepository(raw.to_string())),
        }
    }

    /// `workspace/slug` form used in API paths.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.workspace, self.slug)
    }

    /// `host/workspace/slug` form, unambiguous across hosts.
    pub fn with_host(&self) -> String {
        format!("{}/{}/{}", self.host, self.workspace, self.slug)
    }

    /// Browser URL for this repository.
    pub fn url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.workspace, self.slug)
    }
}

impl PartialEq for RepoIdentity {
    fn eq(&self, other: &Self) -> bool {
        // Host is normalized at construction; workspace and slug compare
        // case-insensitively.
        self.host == other.host
            && self.workspace.eq_ignore_ascii_case(&other.workspace)
            && self.slug.eq_ignore_ascii_case(&other.slug)
    }
}

impl fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.with_host())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Instance {
        Instance::default()
    }

    #[test]
    fn test_parse_short_form() {
        let repo = RepoIdentity::parse("myws/myrepo", &instance()).unwrap();
        assert_eq!(repo.host(), "bitbucket.org");
        assert_eq!(repo.workspace(), "myws");
        assert_eq!(repo.slug(), "myrepo");
    }

    #[test]
    fn test_parse_host_qualified_form() {
        let repo = RepoIdentity::parse("git.example.com/myws/myrepo", &instance()).unwrap();
        assert_eq!(repo.host(), "git.example.com");
        assert_eq!(repo.full_name(), "myws/myrepo");
    }

    #[test]
    fn test_parse_https_url() {
        let repo = RepoIdentity::from_url("https://bitbucket.org/myws/myrepo.git").unwrap();
        assert_eq!(repo, RepoIdentity::new("bitbucket.org", "myws", "myrepo"));
    }

    #[test]
    fn test_parse_ssh_shorthand() {
        let repo = RepoIdentity::from_url("git@bitbucket.org:myws/myrepo.git").unwrap();
        assert_eq!(repo, RepoIdentity::new("bitbucket.org", "myws", "myrepo"));
    }

    #[test]
    fn test_parse_ssh_scheme() {
        let repo = RepoIdentity::from_url("ssh://git@git.example.com/myws/myrepo.git").unwrap();
        assert_eq!(repo, RepoIdentity::new("git.example.com", "myws", "myrepo"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(RepoIdentity::parse("norepo", &instance()).is_err());
        assert!(RepoIdentity::parse("a/b/c/d", &instance()).is_err());
        assert!(RepoIdentity::parse("a//b", &instance()).is_err());
        assert!(RepoIdentity::from_url("not-a-url").is_err());
    }

    #[test]
    fn test_host_normalized_on_construction() {
        let repo = RepoIdentity::new("WWW.BitBucket.ORG", "ws", "slug");
        assert_eq!(repo.host(), "bitbucket.org");
    }

    #[test]
    fn test_equality_is_case_insensitive() {
        let a = RepoIdentity::new("bitbucket.org", "MyWS", "MyRepo");
        let b = RepoIdentity::new("Bitbucket.Org", "myws", "myrepo");
        assert_eq!(a, b);
        assert_ne!(a, RepoIdentity::new("bitbucket.org", "myws", "other"));
    }

    #[test]
    fn test_round_trip_short_form() {
        let repo = RepoIdentity::new("bitbucket.org", "ws", "slug");
        let parsed = RepoIdentity::parse(&repo.full_name(), &instance()).unwrap();
        assert_eq!(parsed, repo);
    }

    #[test]
    fn test_round_trip_host_qualified_form() {
        let repo = RepoIdentity::new("git.example.com", "ws", "slug");
        let parsed = RepoIdentity::parse(&repo.with_host(), &instance()).unwrap();
        assert_eq!(parsed, repo);
    }

    #[test]
    fn test_round_trip_url_form() {
        let repo = RepoIdentity::new("git.example.com", "ws", "slug");
        let parsed = RepoIdentity::parse(&repo.url(), &instance()).unwrap();
        assert_eq!(parsed, repo);
    }
}
