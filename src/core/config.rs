//! Authentication configuration
//!
//! Read-only view over the hosts the user has credentials for, assembled
//! from three layers:
//! - environment variables (`BB_USERNAME` / `BB_APP_PASSWORD`, `BB_HOST`)
//! - the hosts.toml config file
//! - the system keyring (macOS Keychain, Linux Secret Service)
//!
//! Priority for credentials: env var > config file > keyring. The loaded
//! view is memoized once per process; the write paths (login/logout)
//! update the file and keyring directly.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use directories::ProjectDirs;
use keyring::Entry;
use once_cell::sync::OnceCell;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::core::hosts::{normalize_hostname, Instance};
use crate::error::{BbError, Result};

/// Overrides the default host for resolution and API calls.
pub const HOST_ENV: &str = "BB_HOST";
/// Overrides the base repository, bypassing git remotes entirely.
pub const REPO_ENV: &str = "BB_REPO";
/// Credential for the default host, paired with `BB_APP_PASSWORD`.
pub const USERNAME_ENV: &str = "BB_USERNAME";
pub const APP_PASSWORD_ENV: &str = "BB_APP_PASSWORD";
/// Non-empty value enables HTTP request/response logging.
pub const DEBUG_ENV: &str = "BB_DEBUG";

const SERVICE_NAME: &str = "bb";
const HOSTS_FILE: &str = "hosts.toml";

// Loaded at most once per process, read-only thereafter.
static CONFIG: OnceCell<AuthConfig> = OnceCell::new();

/// Where an active credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    EnvVar,
    ConfigFile,
    Keyring,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CredentialSource::EnvVar => "environment variable",
            CredentialSource::ConfigFile => "config file",
            CredentialSource::Keyring => "keyring",
        };
        write!(f, "{label}")
    }
}

/// Where the default host value came from.
///
/// Resolution treats an explicit source (env var or a `default_host`
/// config entry) as a strict filter; the implicit instance default only
/// expresses a preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSource {
    EnvVar,
    ConfigFile,
    Implicit,
}

/// A username + app password pair for Basic authentication.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub secret: SecretString,
}

impl Credential {
    pub fn new(username: &str, app_password: &str) -> Self {
        Self {
            username: username.to_string(),
            secret: SecretString::from(app_password.to_string()),
        }
    }

    /// `Authorization` header value: `Basic base64(username:app_password)`.
    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.username, self.secret.expose_secret());
        format!("Basic {}", BASE64.encode(raw))
    }

    /// Masked form for display (shows first 2 and last 2 chars).
    pub fn masked(&self) -> String {
        let exposed = self.secret.expose_secret();
        if exposed.len() <= 4 {
            "*".repeat(exposed.len())
        } else {
            format!("{}...{}", &exposed[..2], &exposed[exposed.len() - 2..])
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Everything known about one host.
#[derive(Debug, Clone)]
pub struct HostEntry {
    pub username: String,
    pub users: Vec<String>,
    pub credential: Option<(Credential, CredentialSource)>,
}

/// On-disk shape of hosts.toml.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HostsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_host: Option<String>,
    #[serde(default)]
    hosts: BTreeMap<String, HostFileEntry>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct HostFileEntry {
    #[serde(default)]
    username: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    users: Vec<String>,
    /// Plaintext fallback for environments without a usable keyring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_password: Option<String>,
}

/// Read-only authentication configuration for one process.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    instance: Instance,
    hosts: BTreeMap<String, HostEntry>,
    default_host: String,
    default_source: HostSource,
    env_only: bool,
}

impl AuthConfig {
    /// The process-wide configuration, loaded at most once.
    pub fn global() -> Result<&'static AuthConfig> {
        CONFIG.get_or_try_init(AuthConfig::load)
    }

    /// Load the configuration from environment, file and keyring.
    pub fn load() -> Result<Self> {
        let instance = Instance::default();
        let file = Self::read_hosts_file()?;

        let env_host = env::var(HOST_ENV).ok().filter(|v| !v.is_empty());
        let (default_host, default_source) = match (&env_host, &file.default_host) {
            (Some(host), _) => (normalize_hostname(host), HostSource::EnvVar),
            (None, Some(host)) => (normalize_hostname(host), HostSource::ConfigFile),
            (None, None) => (instance.default_host().to_string(), HostSource::Implicit),
        };

        let mut hosts = BTreeMap::new();
        for (host, entry) in &file.hosts {
            let host = normalize_hostname(host);
            let credential = match &entry.app_password {
                Some(password) => Some((
                    Credential::new(&entry.username, password),
                    CredentialSource::ConfigFile,
                )),
                None => Self::keyring_secret(&host, &entry.username)?.map(|secret| {
                    (
                        Credential {
                            username: entry.username.clone(),
                            secret,
                        },
                        CredentialSource::Keyring,
                    )
                }),
            };
            hosts.insert(
                host,
                HostEntry {
                    username: entry.username.clone(),
                    users: entry.users.clone(),
                    credential,
                },
            );
        }

        let env_credential = match (
            env::var(USERNAME_ENV).ok().filter(|v| !v.is_empty()),
            env::var(APP_PASSWORD_ENV).ok().filter(|v| !v.is_empty()),
        ) {
            (Some(username), Some(password)) => Some(Credential::new(&username, &password)),
            _ => None,
        };

        let env_only = env_credential.is_some()
            && !hosts.values().any(|entry| entry.credential.is_some());

        // The env credential belongs to the default host and wins over
        // anything stored for it.
        if let Some(credential) = env_credential {
            hosts.insert(
                default_host.clone(),
                HostEntry {
                    username: credential.username.clone(),
                    users: vec![credential.username.clone()],
                    credential: Some((credential, CredentialSource::EnvVar)),
                },
            );
        }

        Ok(Self {
            instance,
            hosts,
            default_host,
            default_source,
            env_only,
        })
    }

    /// Build a configuration from already-resolved parts.
    ///
    /// Used by tests and by the login flow to verify a candidate
    /// credential before persisting it.
    pub fn from_parts(
        instance: Instance,
        hosts: Vec<(String, HostEntry)>,
        default_host: Option<(String, HostSource)>,
        env_only: bool,
    ) -> Self {
        let (default_host, default_source) = default_host
            .map(|(host, source)| (normalize_hostname(&host), source))
            .unwrap_or_else(|| (instance.default_host().to_string(), HostSource::Implicit));
        Self {
            instance,
            hosts: hosts
                .into_iter()
                .map(|(host, entry)| (normalize_hostname(&host), entry))
                .collect(),
            default_host,
            default_source,
            env_only,
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Hosts with a stored credential.
    pub fn hosts(&self) -> Vec<String> {
        self.hosts
            .iter()
            .filter(|(_, entry)| entry.credential.is_some())
            .map(|(host, _)| host.clone())
            .collect()
    }

    /// The active credential for a host, with its source tag.
    pub fn active_credential(&self, host: &str) -> Option<(&Credential, CredentialSource)> {
        self.hosts
            .get(&normalize_hostname(host))?
            .credential
            .as_ref()
            .map(|(credential, source)| (credential, *source))
    }

    /// The default host and where it came from.
    pub fn default_host(&self) -> (&str, HostSource) {
        (&self.default_host, self.default_source)
    }

    /// Registered users for a host (the active username if none listed).
    pub fn users_for_host(&self, host: &str) -> Vec<String> {
        match self.hosts.get(&normalize_hostname(host)) {
            Some(entry) if !entry.users.is_empty() => entry.users.clone(),
            Some(entry) => vec![entry.username.clone()],
            None => Vec::new(),
        }
    }

    /// Whether the only credential came from the environment.
    pub fn env_only(&self) -> bool {
        self.env_only
    }

    // ─────────────────────────────────────────────────────────────────────
    // Write paths (used by the login/logout flow)
    // ─────────────────────────────────────────────────────────────────────

    /// Persist a credential: app password in the keyring, username in
    /// hosts.toml.
    pub fn store_credential(host: &str, username: &str, app_password: &str) -> Result<()> {
        let host = normalize_hostname(host);
        let entry = Entry::new(SERVICE_NAME, &format!("{username}@{host}"))?;
        entry.set_password(app_password)?;

        let mut file = Self::read_hosts_file()?;
        let host_entry = file.hosts.entry(host).or_default();
        host_entry.username = username.to_string();
        if !host_entry.users.iter().any(|u| u == username) {
            host_entry.users.push(username.to_string());
        }
        Self::write_hosts_file(&file)
    }

    /// Remove the stored credential for a host.
    pub fn delete_credential(host: &str) -> Result<()> {
        let host = normalize_hostname(host);
        let mut file = Self::read_hosts_file()?;
        let Some(entry) = file.hosts.remove(&host) else {
            return Ok(());
        };

        let keyring = Entry::new(SERVICE_NAME, &format!("{}@{host}", entry.username))?;
        match keyring.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(e.into()),
        }
        Self::write_hosts_file(&file)
    }

    fn keyring_secret(host: &str, username: &str) -> Result<Option<SecretString>> {
        let entry = Entry::new(SERVICE_NAME, &format!("{username}@{host}"))?;
        match entry.get_password() {
            Ok(password) => Ok(Some(SecretString::from(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(BbError::Credential(format!(
                "Cannot access system keychain. Make sure your keyring is unlocked. ({})",
                e
            ))),
        }
    }

    fn read_hosts_file() -> Result<HostsFile> {
        let path = Self::hosts_file_path()?;
        if !path.exists() {
            return Ok(HostsFile::default());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn write_hosts_file(file: &HostsFile) -> Result<()> {
        let path = Self::hosts_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(file)?;
        fs::write(&path, contents)?;
        Ok(())
    }

    fn hosts_file_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("org", "bb", "bb")
            .ok_or_else(|| BbError::Config("Could not determine config directory".into()))?;
        Ok(project_dirs.config_dir().join(HOSTS_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(username: &str, password: &str, source: CredentialSource) -> HostEntry {
        HostEntry {
            username: username.to_string(),
            users: vec![username.to_string()],
            credential: Some((Credential::new(username, password), source)),
        }
    }

    #[test]
    fn test_basic_auth_encoding() {
        let credential = Credential::new("me", "s3cret");
        // base64("me:s3cret")
        assert_eq!(credential.basic_auth(), "Basic bWU6czNjcmV0");
    }

    #[test]
    fn test_masked_never_shows_whole_secret() {
        assert_eq!(Credential::new("me", "abcd").masked(), "****");
        assert_eq!(Credential::new("me", "abcdefgh").masked(), "ab...gh");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", Credential::new("me", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_hosts_lists_only_hosts_with_credentials() {
        let config = AuthConfig::from_parts(
            Instance::default(),
            vec![
                (
                    "bitbucket.org".to_string(),
                    entry("me", "pw", CredentialSource::Keyring),
                ),
                (
                    "other.example".to_string(),
                    HostEntry {
                        username: "me".to_string(),
                        users: vec![],
                        credential: None,
                    },
                ),
            ],
            None,
            false,
        );
        assert_eq!(config.hosts(), vec!["bitbucket.org".to_string()]);
    }

    #[test]
    fn test_active_credential_normalizes_host() {
        let config = AuthConfig::from_parts(
            Instance::default(),
            vec![(
                "Bitbucket.Org".to_string(),
                entry("me", "pw", CredentialSource::ConfigFile),
            )],
            None,
            false,
        );
        let (credential, source) = config.active_credential("WWW.BITBUCKET.ORG").unwrap();
        assert_eq!(credential.username, "me");
        assert_eq!(source, CredentialSource::ConfigFile);
    }

    #[test]
    fn test_default_host_falls_back_to_instance() {
        let config = AuthConfig::from_parts(Instance::default(), vec![], None, false);
        let (host, source) = config.default_host();
        assert_eq!(host, "bitbucket.org");
        assert_eq!(source, HostSource::Implicit);
    }

    #[test]
    fn test_users_for_host() {
        let mut host_entry = entry("me", "pw", CredentialSource::Keyring);
        host_entry.users = vec!["me".to_string(), "bot".to_string()];
        let config = AuthConfig::from_parts(
            Instance::default(),
            vec![("bitbucket.org".to_string(), host_entry)],
            None,
            false,
        );
        assert_eq!(config.users_for_host("bitbucket.org"), vec!["me", "bot"]);
        assert!(config.users_for_host("unknown.example").is_empty());
    }
}
