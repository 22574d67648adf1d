//! Recursive registry walk: expand package names into their full
//! transitive dependency closure.
//!
//! The walk is breadth-first over `(name, range)` specs with a visited
//! `(name, version)` set, so cyclic or very deep registry graphs terminate:
//! revisiting a node is a no-op, with no repeat metadata fetch when the
//! range pins the version. Each wave's lookups run concurrently and a
//! failed lookup abandons only its own branch.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::registry::{Registry, RegistryClient};
use crate::version::coerce;

use super::{DependencySpec, UrlSet};

/// Result of expanding one spec: the chosen exact version, its tarball URL,
/// and the child specs to walk next.
struct Expanded {
    name: String,
    version: String,
    url: String,
    children: Vec<DependencySpec>,
}

/// Walks the registry from `specs`, collecting a tarball URL for every
/// reachable `(name, version)` node exactly once.
pub async fn resolve_from_names(
    specs: Vec<DependencySpec>,
    registry: Registry,
    client: Arc<dyn RegistryClient>,
) -> UrlSet {
    let mut set = UrlSet::new();
    let mut visited: HashSet<(String, String)> = HashSet::new();
    let mut frontier = specs;

    while !frontier.is_empty() {
        let mut wave_seen: HashSet<(String, String)> = HashSet::new();
        let mut tasks = JoinSet::new();
        for spec in frontier.drain(..) {
            // A coercible range names its node up front; skip it without a
            // fetch when an earlier wave already collected it. Uncoercible
            // ranges only learn their version from the metadata itself.
            if let Some(version) = coerce(&spec.range) {
                if visited.contains(&(spec.name.clone(), version)) {
                    continue;
                }
            }
            // One fetch per (name, range) within a wave.
            if !wave_seen.insert((spec.name.clone(), spec.range.clone())) {
                continue;
            }
            let client = Arc::clone(&client);
            tasks.spawn(async move { expand_spec(spec, registry, client).await });
        }

        let mut next = Vec::new();
        while let Some(res) = tasks.join_next().await {
            let expanded = match res {
                Ok(Some(e)) => e,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("walk task failed: {}", e);
                    continue;
                }
            };
            if !visited.insert((expanded.name, expanded.version)) {
                continue;
            }
            set.insert(expanded.url);
            next.extend(expanded.children);
        }
        frontier = next;
    }

    set
}

/// Fetches metadata for one spec and picks its concrete version: the
/// coerced range when it contains a literal, else the latest tag. Returns
/// `None` on lookup failure (the branch is abandoned).
async fn expand_spec(
    spec: DependencySpec,
    registry: Registry,
    client: Arc<dyn RegistryClient>,
) -> Option<Expanded> {
    let lookup_name = spec.name.clone();
    let res =
        tokio::task::spawn_blocking(move || client.package_metadata(registry, &lookup_name)).await;
    let meta = match res {
        Ok(Ok(meta)) => meta,
        Ok(Err(e)) => {
            tracing::error!(
                "fetching or processing package info for {} failed: {:#}",
                spec.name,
                e
            );
            return None;
        }
        Err(e) => {
            tracing::error!("lookup task for {} failed: {}", spec.name, e);
            return None;
        }
    };

    let version = coerce(&spec.range).unwrap_or_else(|| meta.dist_tags.latest.clone());
    let url = registry.tarball_url(&spec.name, &version);

    // The chosen version may be absent from the metadata (e.g. a coerced
    // range that never existed); the URL is still collected, the walk just
    // cannot descend further.
    let children = meta
        .versions
        .get(&version)
        .map(|v| {
            let mut merged = v.dependencies.clone();
            merged.extend(v.dev_dependencies.clone());
            merged.extend(v.peer_dependencies.clone());
            merged
                .into_iter()
                .map(|(name, range)| DependencySpec::new(name, range))
                .collect()
        })
        .unwrap_or_default();

    Some(Expanded {
        name: spec.name,
        version,
        url,
        children,
    })
}
