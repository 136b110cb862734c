//! Host and URL allow-lists.
//!
//! Two policies guard every network call:
//! - [`PostUrlPolicy`] decides whether a caller-supplied URL is a post page we
//!   are willing to fetch (https, exact host, known path prefix).
//! - [`MediaHostPolicy`] decides whether a hostname belongs to the media CDN
//!   (fixed suffix plus a restrictive single-label pattern).
//!
//! Both implement [`HostAllowList`], the predicate the guarded fetcher checks
//! on every hop, redirects included.

use url::Url;

use crate::config::{DEFAULT_MEDIA_HOST_SUFFIX, DEFAULT_POST_HOST, DEFAULT_POST_PATH_PREFIXES};

/// A predicate over lowercase hostnames.
///
/// Evaluated for the initial request and for every redirect target.
pub trait HostAllowList: Send + Sync {
    /// Returns true if requests to `host` are permitted.
    fn allows(&self, host: &str) -> bool;
}

impl<F> HostAllowList for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn allows(&self, host: &str) -> bool {
        self(host)
    }
}

/// An exact-match set of permitted hostnames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSet {
    hosts: Vec<String>,
}

impl HostSet {
    /// Creates a host set; entries are normalized to lowercase without a trailing dot.
    #[must_use]
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for host in hosts {
            let host = normalize_host(host.as_ref());
            if !host.is_empty() && !normalized.contains(&host) {
                normalized.push(host);
            }
        }
        Self { hosts: normalized }
    }

    /// Returns the permitted hostnames.
    #[must_use]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }
}

impl HostAllowList for HostSet {
    fn allows(&self, host: &str) -> bool {
        let host = normalize_host(host);
        self.hosts.iter().any(|allowed| *allowed == host)
    }
}

/// Validation rules for caller-supplied post URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUrlPolicy {
    host: String,
    path_prefixes: Vec<String>,
    require_https: bool,
}

impl Default for PostUrlPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POST_HOST, DEFAULT_POST_PATH_PREFIXES.iter().copied())
    }
}

impl PostUrlPolicy {
    /// Creates a policy for `host` accepting any of `path_prefixes`.
    #[must_use]
    pub fn new<I, S>(host: &str, path_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            host: normalize_host(host),
            path_prefixes: path_prefixes.into_iter().map(Into::into).collect(),
            require_https: true,
        }
    }

    /// Relaxes the https requirement (local test servers only).
    #[must_use]
    pub fn allow_insecure(mut self) -> Self {
        self.require_https = false;
        self
    }

    /// Returns the single permitted post host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the permitted path prefixes.
    #[must_use]
    pub fn path_prefixes(&self) -> &[String] {
        &self.path_prefixes
    }

    /// Returns true when plain-http URLs are refused.
    #[must_use]
    pub fn requires_https(&self) -> bool {
        self.require_https
    }

    /// Host allow-list for fetches against the post platform itself.
    #[must_use]
    pub fn allow_list(&self) -> HostSet {
        HostSet::new([self.host.as_str()])
    }

    /// Returns true only for an https URL on the exact post host whose path
    /// starts with an allowed prefix.
    ///
    /// URLs carrying credentials or a non-default port are refused as well.
    #[must_use]
    pub fn is_valid_post_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        let scheme_ok = parsed.scheme() == "https" || (!self.require_https && parsed.scheme() == "http");
        if !scheme_ok {
            return false;
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return false;
        }
        if parsed.port().is_some() && self.require_https {
            return false;
        }
        let Some(host) = parsed.host_str() else {
            return false;
        };
        if normalize_host(host) != self.host {
            return false;
        }
        let path = parsed.path();
        self.path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Allow-list for media CDN hostnames.
///
/// A host passes only when it is `<label>.<suffix>` and `<label>` consists of
/// ASCII letters, digits, and hyphens. Both checks are needed to refuse
/// look-alikes such as `media.licdn.com.attacker.net` or `a.b.licdn.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHostPolicy {
    suffix: String,
}

impl Default for MediaHostPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_HOST_SUFFIX)
    }
}

impl MediaHostPolicy {
    /// Creates a policy for hosts directly under `suffix` (e.g. `licdn.com`).
    #[must_use]
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: normalize_host(suffix.trim_start_matches('.')),
        }
    }

    /// Returns the CDN suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns true if `hostname` is a permitted media CDN host.
    #[must_use]
    pub fn is_allowed_media_host(&self, hostname: &str) -> bool {
        let host = normalize_host(hostname);
        let Some(label) = host
            .strip_suffix(self.suffix.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
        else {
            return false;
        };
        !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    /// Returns true if `url` parses and its host is a permitted media host.
    #[must_use]
    pub fn is_allowed_media_url(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|host| self.is_allowed_media_host(host)))
            .unwrap_or(false)
    }
}

impl HostAllowList for MediaHostPolicy {
    fn allows(&self, host: &str) -> bool {
        self.is_allowed_media_host(host)
    }
}

/// Validates `url` against the default post platform policy.
#[must_use]
pub fn is_valid_post_url(url: &str) -> bool {
    PostUrlPolicy::default().is_valid_post_url(url)
}

/// Validates `hostname` against the default media CDN policy.
#[must_use]
pub fn is_allowed_media_host(hostname: &str) -> bool {
    MediaHostPolicy::default().is_allowed_media_host(hostname)
}

/// Lowercases a host and strips a trailing root dot.
pub(crate) fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}
