//! The domain block set and its loaders.
//!
//! A [`DomainBlockSet`] is a compiled, normalized set of blocked domain
//! names with a subdomain-aware membership test. Construction happens
//! once at startup (see [`source`]); lookups run on the packet path and
//! allocate at most one lowercased copy of the queried name.

pub mod parse;
pub mod source;

use std::collections::HashSet;

/// Compiled set of blocked domains.
///
/// Membership is subdomain-aware: a query matches when the name itself
/// is in the set, or when any suffix produced by stripping leading
/// labels is in the set, as long as that suffix keeps at least two
/// labels. `evil.com` in the set blocks `www.evil.com` and
/// `a.b.evil.com`; it never causes a bare-TLD match, so `good.com` is
/// unaffected by an entry for `evil.com`.
#[derive(Debug, Clone, Default)]
pub struct DomainBlockSet {
    domains: HashSet<String>,
}

impl DomainBlockSet {
    /// Build a block set from an iterator of domain names.
    ///
    /// Entries are lowercased and stripped of trailing dots; empty
    /// entries are discarded.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .filter_map(|d| {
                let d = d.as_ref().trim().to_lowercase();
                let d = d.trim_end_matches('.');
                (!d.is_empty()).then(|| d.to_string())
            })
            .collect();

        Self { domains }
    }

    /// Check whether a domain is blocked.
    #[inline]
    pub fn is_blocked(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        let domain = domain.trim_end_matches('.');

        if self.domains.contains(domain) {
            return true;
        }

        // Walk the suffix chain: drop one leading label at a time, but
        // never test a suffix with fewer than two labels.
        let mut rest = domain;
        while let Some(dot) = rest.find('.') {
            rest = &rest[dot + 1..];
            if !rest.contains('.') {
                break;
            }
            if self.domains.contains(rest) {
                return true;
            }
        }

        false
    }

    /// Number of entries in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// True when the set has no entries. An empty set blocks nothing;
    /// that is a valid state, not an error.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
