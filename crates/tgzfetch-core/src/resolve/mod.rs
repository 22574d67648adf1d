//! Resolution engine: turns dependency sources (lockfile entries, manifest
//! ranges, explicit specifiers) into one deduplicated set of tarball URLs.
//!
//! Every concurrent branch returns the URLs it discovered; the caller
//! merges them into a single `UrlSet`. There is no shared mutable
//! accumulator, so one branch's failure can never corrupt another's
//! results; it just contributes nothing.

mod lockfile;
mod walk;

pub use lockfile::resolve_from_lockfile;
pub use walk::resolve_from_names;

use std::collections::HashSet;

use crate::registry::Registry;

/// A `(name, range-or-exact-version)` pair from a peer list, a manifest, or
/// a CLI `name@version` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub range: String,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
        }
    }
}

/// Insertion-ordered collection of download URLs, deduplicated by exact
/// string equality. Membership is checked before every insert.
#[derive(Debug, Default)]
pub struct UrlSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `url` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.order.push(url);
        true
    }

    pub fn extend<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for url in urls {
            self.insert(url);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn into_urls(self) -> Vec<String> {
        self.order
    }
}

/// Synthesizes tarball URLs for explicitly pinned `name@version` specs.
/// No network: the version is used verbatim.
pub fn resolve_from_specs(specs: &[DependencySpec], registry: Registry) -> UrlSet {
    let mut set = UrlSet::new();
    for spec in specs {
        set.insert(registry.tarball_url(&spec.name, &spec.range));
    }
    set
}
