//! Domain allowlist: the closed set of hosts the proxy may dial.
//!
//! # Responsibilities
//! - Parse configured entries into exact and suffix patterns
//! - Answer "may we forward to this host?" with no locking on the read path
//! - Hold the process-wide snapshot so a reconfiguration can swap it
//!   atomically under in-flight lookups
//!
//! # Design Decisions
//! - Matching is case-insensitive (hostnames are normalized to lowercase)
//! - Suffix patterns keep their leading dot, so `ends_with` owns the dot
//!   boundary: ".xtream.com" can never match "evil-xtream.com"
//! - A suffix entry does not match its own bare domain; deployments add an
//!   exact entry for the apex
//! - An empty allowlist permits nothing (fail closed)

use arc_swap::ArcSwap;
use std::sync::Arc;

/// One configured allowlist pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowlistEntry {
    /// Matches the hostname exactly.
    Exact(String),

    /// Matches any hostname ending with the stored `.suffix`.
    Suffix(String),
}

impl AllowlistEntry {
    /// Parse a raw configuration entry. Blank entries are dropped.
    pub fn parse(raw: &str) -> Option<Self> {
        let entry = raw.trim().to_ascii_lowercase();
        if entry.is_empty() || entry == "." {
            return None;
        }
        if entry.starts_with('.') {
            Some(Self::Suffix(entry))
        } else {
            Some(Self::Exact(entry))
        }
    }

    /// `host` must already be lowercase.
    fn matches(&self, host: &str) -> bool {
        match self {
            Self::Exact(exact) => host == exact,
            Self::Suffix(suffix) => host.ends_with(suffix.as_str()),
        }
    }
}

/// The closed set of hostnames the proxy is permitted to forward to.
#[derive(Debug, Clone, Default)]
pub struct DomainAllowlist {
    entries: Vec<AllowlistEntry>,
}

impl DomainAllowlist {
    pub fn parse<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: raw
                .into_iter()
                .filter_map(|e| AllowlistEntry::parse(e.as_ref()))
                .collect(),
        }
    }

    /// Whether `host` matches any entry. Empty allowlist permits nothing.
    pub fn permits(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.entries.iter().any(|entry| entry.matches(&host))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Shared, atomically replaceable allowlist snapshot.
///
/// Lookups load the current snapshot without locking; [`replace`] installs a
/// new one while requests already in flight keep the snapshot they loaded.
///
/// [`replace`]: AllowlistHandle::replace
#[derive(Debug, Default)]
pub struct AllowlistHandle {
    current: ArcSwap<DomainAllowlist>,
}

impl AllowlistHandle {
    pub fn new(allowlist: DomainAllowlist) -> Self {
        Self {
            current: ArcSwap::from_pointee(allowlist),
        }
    }

    pub fn snapshot(&self) -> Arc<DomainAllowlist> {
        self.current.load_full()
    }

    pub fn replace(&self, allowlist: DomainAllowlist) {
        self.current.store(Arc::new(allowlist));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_entries_match_exactly() {
        let allowlist = DomainAllowlist::parse(["example.com"]);
        assert!(allowlist.permits("example.com"));
        assert!(allowlist.permits("EXAMPLE.com"));
        assert!(!allowlist.permits("sub.example.com"));
        assert!(!allowlist.permits("example.org"));
    }

    #[test]
    fn suffix_entries_own_the_dot_boundary() {
        let allowlist = DomainAllowlist::parse([".xtream.com"]);
        assert!(allowlist.permits("live.xtream.com"));
        assert!(allowlist.permits("a.b.xtream.com"));
        assert!(!allowlist.permits("evil-xtream.com"));
        assert!(!allowlist.permits("evilxtream.com"));
    }

    #[test]
    fn suffix_entries_do_not_match_the_bare_domain() {
        let allowlist = DomainAllowlist::parse([".example.com"]);
        assert!(!allowlist.permits("example.com"));

        // The apex needs its own exact entry.
        let allowlist = DomainAllowlist::parse([".example.com", "example.com"]);
        assert!(allowlist.permits("example.com"));
        assert!(allowlist.permits("sub.example.com"));
    }

    #[test]
    fn empty_allowlist_permits_nothing() {
        let allowlist = DomainAllowlist::default();
        assert!(!allowlist.permits("example.com"));
        assert!(!allowlist.permits("localhost"));
    }

    #[test]
    fn blank_entries_are_dropped() {
        let allowlist = DomainAllowlist::parse(["", "  ", ".", "ok.example.com"]);
        assert_eq!(allowlist.len(), 1);
    }

    #[test]
    fn handle_swaps_snapshots_atomically() {
        let handle = AllowlistHandle::new(DomainAllowlist::parse([".old.com"]));
        let before = handle.snapshot();

        handle.replace(DomainAllowlist::parse([".new.com"]));

        // The pre-swap snapshot keeps answering with the old policy.
        assert!(before.permits("a.old.com"));
        assert!(!handle.snapshot().permits("a.old.com"));
        assert!(handle.snapshot().permits("a.new.com"));
    }
}
