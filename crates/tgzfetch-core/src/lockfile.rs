//! `package-lock.json` / `package.json` parsing.
//!
//! Explicit records carrying only the consumed fields; unknown fields are
//! ignored. The lockfile shape is validated structurally: a document with
//! neither a `packages` nor a `dependencies` map was produced by an npm
//! whose lockfile format we do not understand, and that is fatal.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// npm version whose lockfile format this tool understands. Named in the
/// structural-error message so operators know what to install.
pub const REQUIRED_NPM_VERSION: &str = "9.8.1";

/// One resolved dependency record from the lockfile. Read-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockEntry {
    #[serde(default)]
    pub version: Option<String>,
    /// Direct download URL, when the lockfile pinned one.
    #[serde(default)]
    pub resolved: Option<String>,
    /// Peer ranges the lockfile leaves unresolved.
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawPackageLock {
    #[serde(default)]
    packages: Option<BTreeMap<String, LockEntry>>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, LockEntry>>,
}

/// Parsed lockfile: the entry map actually present in the document
/// (`packages` for npm v7+ lockfiles, `dependencies` for older ones).
#[derive(Debug)]
pub struct PackageLock {
    pub entries: BTreeMap<String, LockEntry>,
}

/// Why a lockfile could not be used. The CLI treats both variants as fatal.
#[derive(Debug, thiserror::Error)]
pub enum LockfileError {
    #[error("package-lock.json is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "package-lock.json has neither a `packages` nor a `dependencies` map; \
         regenerate it with npm {REQUIRED_NPM_VERSION}"
    )]
    MissingDependencyTables,
}

/// Parses lockfile text, validating that one of the two dependency tables
/// is present. `packages` wins when both exist.
pub fn parse_lockfile(data: &str) -> Result<PackageLock, LockfileError> {
    let raw: RawPackageLock = serde_json::from_str(data)?;
    let entries = raw
        .packages
        .or(raw.dependencies)
        .ok_or(LockfileError::MissingDependencyTables)?;
    Ok(PackageLock { entries })
}

/// Reads and parses `package-lock.json` at `path`.
pub fn read_lockfile(path: &Path) -> Result<PackageLock> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("read lockfile: {}", path.display()))?;
    Ok(parse_lockfile(&data)?)
}

/// A project manifest (`package.json`): direct dependency ranges.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
}

impl Manifest {
    /// Merges the three dependency maps into one name → range map.
    /// Later maps win on key collision.
    pub fn all_dependencies(&self) -> BTreeMap<String, String> {
        let mut merged = self.dependencies.clone();
        merged.extend(self.dev_dependencies.clone());
        merged.extend(self.peer_dependencies.clone());
        merged
    }
}

/// Reads and parses `package.json` at `path`.
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("read manifest: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("parse manifest: {}", path.display()))
}
