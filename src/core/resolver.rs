//! Remote resolution and base repository selection
//!
//! Translates the local git remotes into repository identities, filters
//! and orders them against the hosts the user is authenticated to, and
//! picks the single repository a repo-scoped command should target.

use std::collections::BTreeSet;

use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::core::config::{AuthConfig, HostSource};
use crate::core::git::{GitRepository, RemoteSource};
use crate::core::hosts::normalize_hostname;
use crate::core::repository::RepoIdentity;
use crate::error::Result;

/// Remote name that sorts ahead of all others.
const PRIMARY_REMOTE: &str = "origin";

/// Hint value marking a remote as the base repository.
const BASE_HINT: &str = "base";

/// Resolution failures, each with a distinct user-actionable message.
///
/// Kept separate from [`crate::error::BbError`] (and `Clone`) so the
/// resolver can cache an error outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No git remotes found in this repository.\n\n  → Run 'git remote add origin <url>' to add one, or pass --repo explicitly.")]
    NoRemotes,

    #[error("Not logged in to any host.\n\n  → Run 'bb auth login' to authenticate.")]
    NoAuthenticatedHosts,

    #[error("None of the git remotes point to {host}.\n\n  → Add a remote for {host}, or unset the BB_HOST / default_host override.")]
    HostMismatch { host: String },

    #[error("Credentials come from BB_USERNAME/BB_APP_PASSWORD only, and no remote matches the default host.\n\n  → Set BB_HOST to the host those credentials belong to.")]
    EnvCredentialAmbiguous,

    #[error("None of the git remotes point to a host you are logged in to.\n\n  → Run 'bb auth login' first.")]
    NoAuthenticatedRemote,

    #[error("Multiple remotes are valid candidates.\n\n  → Disambiguate with --repo or the BB_REPO environment variable.")]
    AmbiguousRemote,

    #[error("Cannot read git remotes: {0}")]
    Git(String),
}

/// A git remote translated to a repository identity.
#[derive(Debug, Clone)]
pub struct Remote {
    pub name: String,
    pub repo: RepoIdentity,
    /// Out-of-band hint: empty, `"base"`, or a `workspace/slug` alias.
    pub resolved: String,
}

/// Resolves git remotes against the authentication configuration.
///
/// The result (or the error) is computed at most once per resolver
/// instance; commands construct a fresh resolver per invocation.
pub struct Resolver<'a, S: RemoteSource> {
    source: S,
    auth: &'a AuthConfig,
    cell: OnceCell<std::result::Result<Vec<Remote>, ResolveError>>,
}

impl<'a, S: RemoteSource> Resolver<'a, S> {
    pub fn new(source: S, auth: &'a AuthConfig) -> Self {
        Self {
            source,
            auth,
            cell: OnceCell::new(),
        }
    }

    /// The candidate remotes, filtered and ordered deterministically.
    pub fn resolve(&self) -> Result<&[Remote]> {
        let cached = self.cell.get_or_init(|| self.compute());
        match cached {
            Ok(remotes) => Ok(remotes.as_slice()),
            Err(e) => Err(e.clone().into()),
        }
    }

    fn compute(&self) -> std::result::Result<Vec<Remote>, ResolveError> {
        let raw = self
            .source
            .remotes()
            .map_err(|e| ResolveError::Git(e.to_string()))?;
        if raw.is_empty() {
            return Err(ResolveError::NoRemotes);
        }

        // Remotes whose URL cannot be translated are dropped silently.
        let mut remotes: Vec<Remote> = raw
            .into_iter()
            .filter_map(|remote| {
                RepoIdentity::from_url(&remote.url).ok().map(|repo| Remote {
                    name: remote.name,
                    repo,
                    resolved: remote.resolved,
                })
            })
            .collect();

        let auth_hosts = self.auth.hosts();
        if auth_hosts.is_empty() {
            return Err(ResolveError::NoAuthenticatedHosts);
        }

        let (default_host, default_source) = self.auth.default_host();
        let instance_host = self.auth.instance().default_host();

        let mut candidates: BTreeSet<String> =
            auth_hosts.iter().map(|h| normalize_hostname(h)).collect();
        candidates.insert(normalize_hostname(default_host));
        candidates.insert(instance_host.to_string());

        // Stable sort: origin first, then alphabetical by remote name.
        // Stability keeps the later filters deterministic.
        remotes.sort_by(|a, b| {
            (a.name != PRIMARY_REMOTE, a.name.as_str())
                .cmp(&(b.name != PRIMARY_REMOTE, b.name.as_str()))
        });

        remotes.retain(|remote| candidates.contains(remote.repo.host()));

        match default_source {
            // An explicit default host filters strictly.
            HostSource::EnvVar | HostSource::ConfigFile => {
                remotes.retain(|remote| remote.repo.host() == default_host);
            }
            // The implicit default only expresses a preference: narrow to
            // it when possible, otherwise keep the broader list.
            HostSource::Implicit => {
                let preferred: Vec<Remote> = remotes
                    .iter()
                    .filter(|remote| remote.repo.host() == default_host)
                    .cloned()
                    .collect();
                if !preferred.is_empty() {
                    remotes = preferred;
                }
            }
        }

        if remotes.is_empty() {
            return Err(match default_source {
                HostSource::EnvVar | HostSource::ConfigFile => ResolveError::HostMismatch {
                    host: default_host.to_string(),
                },
                HostSource::Implicit if self.auth.env_only() => {
                    ResolveError::EnvCredentialAmbiguous
                }
                HostSource::Implicit => ResolveError::NoAuthenticatedRemote,
            });
        }

        Ok(remotes)
    }
}

/// Pick the single repository a repo-scoped command targets.
///
/// Precedence: explicit override (parsed directly, git never consulted),
/// a `"base"`-hinted remote, an alias hint (hinted workspace/slug on the
/// remote's own host), then the first candidate when non-interactive or
/// unambiguous. Multiple candidates in an interactive context are
/// reported as [`ResolveError::AmbiguousRemote`] rather than guessed at.
pub fn base_repo<S: RemoteSource>(
    override_spec: Option<&str>,
    resolver: &Resolver<'_, S>,
    interactive: bool,
) -> Result<RepoIdentity> {
    if let Some(spec) = override_spec {
        return RepoIdentity::parse(spec, resolver.auth.instance());
    }

    let remotes = resolver.resolve()?;

    if let Some(remote) = remotes.iter().find(|r| r.resolved == BASE_HINT) {
        return Ok(remote.repo.clone());
    }

    if let Some(remote) = remotes.iter().find(|r| !r.resolved.is_empty()) {
        // The hint names a workspace/slug; the host always stays the
        // remote's own.
        let hinted = RepoIdentity::parse(&remote.resolved, resolver.auth.instance())?;
        return Ok(RepoIdentity::new(
            remote.repo.host(),
            hinted.workspace(),
            hinted.slug(),
        ));
    }

    if !interactive || remotes.len() == 1 {
        return Ok(remotes[0].repo.clone());
    }

    Err(ResolveError::AmbiguousRemote.into())
}

/// Resolve the base repository for a command invocation.
///
/// With an override the git repository is never opened, so overrides work
/// outside any working tree.
pub fn resolve_base_repo(
    override_spec: Option<&str>,
    auth: &AuthConfig,
    interactive: bool,
) -> Result<RepoIdentity> {
    if let Some(spec) = override_spec {
        return RepoIdentity::parse(spec, auth.instance());
    }
    let source = GitRepository::open_current_dir()?;
    let resolver = Resolver::new(source, auth);
    base_repo(None, &resolver, interactive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Credential, CredentialSource, HostEntry};
    use crate::core::git::{GitRemote, MockRemoteSource};
    use crate::core::hosts::Instance;
    use crate::error::BbError;

    fn authed_host(host: &str) -> (String, HostEntry) {
        (
            host.to_string(),
            HostEntry {
                username: "me".to_string(),
                users: vec!["me".to_string()],
                credential: Some((Credential::new("me", "pw"), CredentialSource::Keyring)),
            },
        )
    }

    fn auth_for(hosts: &[&str], default: Option<(&str, HostSource)>, env_only: bool) -> AuthConfig {
        AuthConfig::from_parts(
            Instance::default(),
            hosts.iter().map(|h| authed_host(h)).collect(),
            default.map(|(h, s)| (h.to_string(), s)),
            env_only,
        )
    }

    fn remote(name: &str, url: &str) -> GitRemote {
        GitRemote {
            name: name.to_string(),
            url: url.to_string(),
            resolved: String::new(),
        }
    }

    fn source_with(remotes: Vec<GitRemote>) -> MockRemoteSource {
        let mut source = MockRemoteSource::new();
        source.expect_remotes().return_once(move || Ok(remotes));
        source
    }

    #[test]
    fn test_empty_remote_set_fails() {
        let auth = auth_for(&["bitbucket.org"], None, false);
        let resolver = Resolver::new(source_with(vec![]), &auth);
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(
            err,
            BbError::Resolve(ResolveError::NoRemotes)
        ));
    }

    #[test]
    fn test_no_authenticated_hosts_fails() {
        let auth = auth_for(&[], None, false);
        let resolver = Resolver::new(
            source_with(vec![remote("origin", "https://bitbucket.org/ws/repo.git")]),
            &auth,
        );
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(
            err,
            BbError::Resolve(ResolveError::NoAuthenticatedHosts)
        ));
    }

    #[test]
    fn test_untranslatable_remotes_dropped_silently() {
        let auth = auth_for(&["bitbucket.org"], None, false);
        let resolver = Resolver::new(
            source_with(vec![
                remote("backup", "/srv/mirrors/repo.git"),
                remote("origin", "https://bitbucket.org/ws/repo.git"),
            ]),
            &auth,
        );
        let remotes = resolver.resolve().unwrap();
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].name, "origin");
    }

    #[test]
    fn test_implicit_default_filters_to_authenticated_host_in_order() {
        // Hosts {x.org, y.org}, credentials only for x.org, implicit
        // default: only x.org remotes survive, in stable order.
        let auth = auth_for(&["x.org"], Some(("x.org", HostSource::Implicit)), false);
        let resolver = Resolver::new(
            source_with(vec![
                remote("alpha", "https://x.org/ws/a.git"),
                remote("origin", "https://y.org/ws/b.git"),
                remote("beta", "https://x.org/ws/c.git"),
            ]),
            &auth,
        );
        let remotes = resolver.resolve().unwrap();
        let names: Vec<&str> = remotes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_origin_sorts_first() {
        let auth = auth_for(&["x.org"], Some(("x.org", HostSource::Implicit)), false);
        let resolver = Resolver::new(
            source_with(vec![
                remote("upstream", "https://x.org/ws/up.git"),
                remote("origin", "https://x.org/ws/main.git"),
                remote("fork", "https://x.org/ws/fork.git"),
            ]),
            &auth,
        );
        let remotes = resolver.resolve().unwrap();
        let names: Vec<&str> = remotes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["origin", "fork", "upstream"]);
    }

    #[test]
    fn test_explicit_override_mismatch_is_an_error_not_a_fallback() {
        let auth = auth_for(&["x.org"], Some(("c.org", HostSource::EnvVar)), false);
        let resolver = Resolver::new(
            source_with(vec![
                remote("origin", "https://x.org/ws/a.git"),
                remote("fork", "https://y.org/ws/b.git"),
            ]),
            &auth,
        );
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(
            err,
            BbError::Resolve(ResolveError::HostMismatch { ref host }) if host == "c.org"
        ));
    }

    #[test]
    fn test_env_only_credentials_suggest_host_override() {
        let auth = auth_for(
            &["bitbucket.org"],
            Some(("bitbucket.org", HostSource::Implicit)),
            true,
        );
        let resolver = Resolver::new(
            source_with(vec![remote("origin", "https://elsewhere.org/ws/a.git")]),
            &auth,
        );
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(
            err,
            BbError::Resolve(ResolveError::EnvCredentialAmbiguous)
        ));
    }

    #[test]
    fn test_no_remote_on_authenticated_host() {
        let auth = auth_for(&["x.org"], None, false);
        let resolver = Resolver::new(
            source_with(vec![remote("origin", "https://elsewhere.org/ws/a.git")]),
            &auth,
        );
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(
            err,
            BbError::Resolve(ResolveError::NoAuthenticatedRemote)
        ));
    }

    #[test]
    fn test_resolution_is_memoized_per_instance() {
        let auth = auth_for(&["x.org"], None, false);
        let mut source = MockRemoteSource::new();
        source
            .expect_remotes()
            .times(1)
            .returning(|| Ok(vec![remote("origin", "https://x.org/ws/a.git")]));
        let resolver = Resolver::new(source, &auth);
        assert_eq!(resolver.resolve().unwrap().len(), 1);
        // Second call must not re-read git state (mock allows one call).
        assert_eq!(resolver.resolve().unwrap().len(), 1);
    }

    #[test]
    fn test_base_repo_single_remote() {
        let auth = auth_for(&["x.org"], Some(("x.org", HostSource::Implicit)), false);
        let resolver = Resolver::new(
            source_with(vec![remote("origin", "https://x.org/w/r.git")]),
            &auth,
        );
        let repo = base_repo(None, &resolver, true).unwrap();
        assert_eq!(repo, RepoIdentity::new("x.org", "w", "r"));
    }

    #[test]
    fn test_base_repo_override_bypasses_git_entirely() {
        let auth = auth_for(&[], None, false);
        let mut source = MockRemoteSource::new();
        source.expect_remotes().times(0);
        let resolver = Resolver::new(source, &auth);
        let repo = base_repo(Some("h.org/ws/slug"), &resolver, true).unwrap();
        assert_eq!(repo, RepoIdentity::new("h.org", "ws", "slug"));
    }

    #[test]
    fn test_base_repo_override_parse_error() {
        let auth = auth_for(&[], None, false);
        let mut source = MockRemoteSource::new();
        source.expect_remotes().times(0);
        let resolver = Resolver::new(source, &auth);
        let err = base_repo(Some("not-a-repo"), &resolver, true).unwrap_err();
        assert!(matches!(err, BbError::InvalidRepository(_)));
    }

    #[test]
    fn test_base_repo_honors_base_hint() {
        let auth = auth_for(&["x.org"], None, false);
        let resolver = Resolver::new(
            source_with(vec![
                GitRemote {
                    name: "origin".to_string(),
                    url: "https://x.org/w/fork.git".to_string(),
                    resolved: String::new(),
                },
                GitRemote {
                    name: "upstream".to_string(),
                    url: "https://x.org/w/main.git".to_string(),
                    resolved: BASE_HINT.to_string(),
                },
            ]),
            &auth,
        );
        let repo = base_repo(None, &resolver, true).unwrap();
        assert_eq!(repo, RepoIdentity::new("x.org", "w", "main"));
    }

    #[test]
    fn test_base_repo_alias_hint_keeps_remote_host() {
        let auth = auth_for(&["x.org"], None, false);
        let resolver = Resolver::new(
            source_with(vec![GitRemote {
                name: "origin".to_string(),
                url: "https://x.org/me/fork.git".to_string(),
                resolved: "upstream-ws/real-repo".to_string(),
            }]),
            &auth,
        );
        let repo = base_repo(None, &resolver, true).unwrap();
        // Hinted workspace/slug, but the remote's own host.
        assert_eq!(repo, RepoIdentity::new("x.org", "upstream-ws", "real-repo"));
    }

    #[test]
    fn test_base_repo_non_interactive_takes_first() {
        let auth = auth_for(&["x.org"], None, false);
        let resolver = Resolver::new(
            source_with(vec![
                remote("origin", "https://x.org/w/a.git"),
                remote("fork", "https://x.org/w/b.git"),
            ]),
            &auth,
        );
        let repo = base_repo(None, &resolver, false).unwrap();
        assert_eq!(repo, RepoIdentity::new("x.org", "w", "a"));
    }

    #[test]
    fn test_base_repo_interactive_multiple_candidates_is_ambiguous() {
        let auth = auth_for(&["x.org"], None, false);
        let resolver = Resolver::new(
            source_with(vec![
                remote("origin", "https://x.org/w/a.git"),
                remote("fork", "https://x.org/w/b.git"),
            ]),
            &auth,
        );
        let err = base_repo(None, &resolver, true).unwrap_err();
        assert!(matches!(
            err,
            BbError::Resolve(ResolveError::AmbiguousRemote)
        ));
    }
}
