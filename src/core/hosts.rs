//! Hostname normalization and API base URL derivation
//!
//! Every host string that enters the program goes through
//! [`normalize_hostname`] before it is compared or stored, so equality
//! checks elsewhere can be plain string comparisons.

/// Hostname of the public Bitbucket Cloud instance.
const PUBLIC_INSTANCE: &str = "bitbucket.org";

/// REST API version segment used in base URLs.
const API_VERSION: &str = "2.0";

/// Normalize a hostname: lower-case and strip a leading `www.`.
///
/// Idempotent: `normalize_hostname(&normalize_hostname(h)) == normalize_hostname(h)`.
pub fn normalize_hostname(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// The deployment the CLI talks to by default.
///
/// The default hostname is carried as a value rather than consulted as a
/// global so alternate deployments can be exercised in tests without
/// recompiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    default_host: String,
}

impl Default for Instance {
    fn default() -> Self {
        Self {
            default_host: PUBLIC_INSTANCE.to_string(),
        }
    }
}

impl Instance {
    pub fn new(default_host: &str) -> Self {
        Self {
            default_host: normalize_hostname(default_host),
        }
    }

    /// The hostname used when none is given explicitly.
    pub fn default_host(&self) -> &str {
        &self.default_host
    }

    /// Whether `host` names this instance's default deployment.
    pub fn is_default_instance(&self, host: &str) -> bool {
        normalize_hostname(host) == self.default_host
    }

    /// REST API root for a host.
    ///
    /// The public instance lives at `https://api.bitbucket.org/2.0/`;
    /// self-hosted variants are assumed to follow the same `api.<host>`
    /// convention. Pure, no I/O, no error cases.
    pub fn rest_base_url(&self, host: &str) -> String {
        format!("https://api.{}/{}/", normalize_hostname(host), API_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips_www() {
        assert_eq!(normalize_hostname("WWW.Example.COM"), "example.com");
        assert_eq!(
            normalize_hostname("WWW.Example.COM"),
            normalize_hostname("example.com")
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_hostname("WWW.BitBucket.ORG");
        assert_eq!(normalize_hostname(&once), once);
    }

    #[test]
    fn test_www_only_stripped_as_prefix() {
        assert_eq!(normalize_hostname("wwwexample.com"), "wwwexample.com");
        assert_eq!(normalize_hostname("api.www.com"), "api.www.com");
    }

    #[test]
    fn test_default_instance_detection() {
        let instance = Instance::default();
        assert!(instance.is_default_instance("bitbucket.org"));
        assert!(instance.is_default_instance("WWW.Bitbucket.Org"));
        assert!(!instance.is_default_instance("bitbucket.example.com"));
    }

    #[test]
    fn test_rest_base_url() {
        let instance = Instance::default();
        assert_eq!(
            instance.rest_base_url("bitbucket.org"),
            "https://api.bitbucket.org/2.0/"
        );
        assert_eq!(
            instance.rest_base_url("Git.Example.COM"),
            "https://api.git.example.com/2.0/"
        );
    }

    #[test]
    fn test_alternate_instance() {
        let instance = Instance::new("WWW.Code.Corp.example");
        assert_eq!(instance.default_host(), "code.corp.example");
        assert!(instance.is_default_instance("code.corp.example"));
        assert!(!instance.is_default_instance("bitbucket.org"));
    }
}
