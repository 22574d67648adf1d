//! Registry model: named registries, URL synthesis, and the metadata
//! records fetched for a package name.
//!
//! The resolution engine only depends on the `RegistryClient` trait and
//! does not know which HTTP client (or test fake) sits behind it.

use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::http::{self, HttpTimeouts};

/// Percent-encoding matching JS `encodeURIComponent` (scoped package names
/// become `%40scope%2Fname` in metadata URLs).
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The four supported package registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Registry {
    #[default]
    Npm,
    Cnpm,
    Yarn,
    Taobao,
}

impl Registry {
    /// Base URL, with trailing slash.
    pub fn base_url(self) -> &'static str {
        match self {
            Registry::Npm => "https://registry.npmjs.org/",
            Registry::Cnpm => "https://r.cnpmjs.org/",
            Registry::Yarn => "https://registry.yarnpkg.com/",
            Registry::Taobao => "https://registry.npmmirror.com/",
        }
    }

    /// Metadata endpoint for a package name.
    pub fn metadata_url(self, name: &str) -> String {
        format!(
            "{}{}",
            self.base_url(),
            utf8_percent_encode(name, URI_COMPONENT)
        )
    }

    /// Tarball URL for an exact version, following the registry convention
    /// `<base><name>/-/<basename>-<version>.tgz`. For scoped names the
    /// basename is the part after the slash.
    pub fn tarball_url(self, name: &str, version: &str) -> String {
        let basename = match name.split_once('/') {
            Some((scope, rest)) if scope.starts_with('@') => rest,
            _ => name,
        };
        format!("{}{}/-/{}-{}.tgz", self.base_url(), name, basename, version)
    }
}

/// One exact version's own dependency maps, as returned by the registry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionMetadata {
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistTags {
    pub latest: String,
}

/// Registry response for `GET <base>/<name>`. Only the consumed fields are
/// modeled; anything else in the response is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMetadata {
    #[serde(rename = "dist-tags")]
    pub dist_tags: DistTags,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionMetadata>,
}

/// Fetches package metadata by name. Implemented over HTTP in production
/// and by counting fakes in engine tests.
pub trait RegistryClient: Send + Sync {
    fn package_metadata(&self, registry: Registry, name: &str) -> Result<PackageMetadata>;
}

/// Production client over libcurl. Blocking; the engine calls it from
/// `spawn_blocking`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpRegistryClient {
    pub timeouts: HttpTimeouts,
}

impl RegistryClient for HttpRegistryClient {
    fn package_metadata(&self, registry: Registry, name: &str) -> Result<PackageMetadata> {
        let url = registry.metadata_url(name);
        let body = http::get_bytes(&url, self.timeouts)
            .with_context(|| format!("fetch metadata for {}", name))?;
        serde_json::from_slice(&body)
            .with_context(|| format!("parse metadata for {}", name))
    }
}
