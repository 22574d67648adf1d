//! Lockfile resolution: collect pinned `resolved` URLs and expand the peer
//! ranges the lockfile leaves unresolved.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::lockfile::LockEntry;
use crate::registry::{Registry, RegistryClient};
use crate::version::coerce;

use super::UrlSet;

/// Resolves every lockfile entry to its download URLs.
///
/// Entries are processed concurrently, as is each entry's peer expansion.
/// All branches are joined before returning; a failure in one entry or peer
/// is logged and skipped, never aborting siblings.
pub async fn resolve_from_lockfile(
    entries: &BTreeMap<String, LockEntry>,
    registry: Registry,
    client: Arc<dyn RegistryClient>,
) -> UrlSet {
    let mut tasks = JoinSet::new();
    for (name, entry) in entries {
        let name = name.clone();
        let entry = entry.clone();
        let client = Arc::clone(&client);
        tasks.spawn(async move { resolve_entry(name, entry, registry, client).await });
    }

    let mut set = UrlSet::new();
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(urls) => set.extend(urls),
            Err(e) => tracing::error!("lockfile entry task failed: {}", e),
        }
    }
    set
}

/// One entry: its own pinned URL (if any) plus its resolved peers.
async fn resolve_entry(
    name: String,
    entry: LockEntry,
    registry: Registry,
    client: Arc<dyn RegistryClient>,
) -> Vec<String> {
    let mut urls = Vec::new();

    match entry.resolved {
        Some(resolved) => urls.push(resolved),
        // The npm v3 `packages` map has a root entry keyed "" with no URL.
        None if !name.is_empty() => {
            tracing::warn!(
                "[{}] no download location available for this package; download it manually",
                name
            );
        }
        None => {}
    }

    let mut peers = JoinSet::new();
    for (peer_name, range) in entry.peer_dependencies {
        let client = Arc::clone(&client);
        peers.spawn(async move { resolve_peer(peer_name, range, registry, client).await });
    }
    while let Some(res) = peers.join_next().await {
        match res {
            Ok(Some(url)) => urls.push(url),
            Ok(None) => {}
            Err(e) => tracing::error!("peer task failed: {}", e),
        }
    }

    urls
}

/// One peer range: coerce to a literal version locally when possible,
/// otherwise ask the registry for the latest tag. Returns `None` when the
/// lookup fails (that peer is skipped).
async fn resolve_peer(
    name: String,
    range: String,
    registry: Registry,
    client: Arc<dyn RegistryClient>,
) -> Option<String> {
    if let Some(version) = coerce(&range) {
        return Some(registry.tarball_url(&name, &version));
    }

    let lookup_name = name.clone();
    let res =
        tokio::task::spawn_blocking(move || client.package_metadata(registry, &lookup_name)).await;
    match res {
        Ok(Ok(meta)) => Some(registry.tarball_url(&name, &meta.dist_tags.latest)),
        Ok(Err(e)) => {
            tracing::warn!("peer {}: registry lookup failed: {:#}", name, e);
            None
        }
        Err(e) => {
            tracing::error!("peer {}: lookup task failed: {}", name, e);
            None
        }
    }
}
