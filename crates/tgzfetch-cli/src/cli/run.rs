//! Command orchestration: resolve URLs, reset the workspace, download,
//! report. Only structural input errors (a bad lockfile) propagate out;
//! everything per-item is handled inside the engine and downloader.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tgzfetch_core::config::TgzConfig;
use tgzfetch_core::download::{run_downloads, CurlTransport};
use tgzfetch_core::http::HttpTimeouts;
use tgzfetch_core::lockfile;
use tgzfetch_core::registry::{HttpRegistryClient, RegistryClient};
use tgzfetch_core::resolve::{self, DependencySpec, UrlSet};
use tgzfetch_core::workspace;

use super::Cli;

const ARCHIVE_DIR: &str = "tgz";
const ERROR_LOG: &str = "error.txt";

pub async fn run(cli: Cli, cfg: TgzConfig) -> Result<()> {
    let registry = cli.registry();
    let timeouts = HttpTimeouts {
        connect: Duration::from_secs(cfg.connect_timeout_secs),
        total: Duration::from_secs(cfg.request_timeout_secs),
    };
    let client: Arc<dyn RegistryClient> = Arc::new(HttpRegistryClient { timeouts });

    let urls = if cli.pkgs.is_empty() {
        println!("collecting tarball URLs from package-lock.json, this may take a while...");
        let lock = lockfile::read_lockfile(Path::new("package-lock.json"))?;
        resolve::resolve_from_lockfile(&lock.entries, registry, client).await
    } else if cli.pkgs.iter().any(|p| p == "package.json") {
        println!("walking the dependency tree of package.json, this may take a while...");
        let manifest = lockfile::read_manifest(Path::new("package.json"))?;
        let specs = manifest
            .all_dependencies()
            .into_iter()
            .map(|(name, range)| DependencySpec::new(name, range))
            .collect();
        let mut urls = resolve::resolve_from_names(specs, registry, client).await;
        // name@version tokens given alongside package.json are downloaded too
        urls.extend(
            resolve::resolve_from_specs(&specifiers_without_manifest(&cli.pkgs), registry)
                .into_urls(),
        );
        urls
    } else {
        resolve::resolve_from_specs(&parse_specifiers(&cli.pkgs), registry)
    };

    download_all(
        urls,
        cli.token.as_deref(),
        timeouts,
        cfg.max_concurrent_requests,
    )
    .await
}

/// Parses `name@version` tokens into specs. A token without a version is
/// reported and skipped; the rest of the run proceeds. Scoped names keep
/// their leading `@`.
pub(crate) fn parse_specifiers(pkgs: &[String]) -> Vec<DependencySpec> {
    let mut specs = Vec::new();
    for pkg in pkgs {
        match split_specifier(pkg) {
            Some((name, version)) => specs.push(DependencySpec::new(name, version)),
            None => {
                tracing::warn!("malformed specifier [{}], expected name@version", pkg);
                eprintln!("specify a version for [{pkg}] (name@version); skipping it");
            }
        }
    }
    specs
}

/// Specs for the explicit `name@version` tokens of a mixed invocation
/// (`tgzfetch package.json foo@1.0.0`); the manifest token itself is not a
/// specifier.
pub(crate) fn specifiers_without_manifest(pkgs: &[String]) -> Vec<DependencySpec> {
    let rest: Vec<String> = pkgs
        .iter()
        .filter(|p| p.as_str() != "package.json")
        .cloned()
        .collect();
    parse_specifiers(&rest)
}

/// Splits a specifier at the last `@`. The `@` at position 0 is a scope
/// marker, not a separator.
fn split_specifier(pkg: &str) -> Option<(&str, &str)> {
    let at = pkg.rfind('@').filter(|&i| i > 0)?;
    let (name, version) = (&pkg[..at], &pkg[at + 1..]);
    if version.is_empty() {
        return None;
    }
    Some((name, version))
}

async fn download_all(
    urls: UrlSet,
    token: Option<&str>,
    timeouts: HttpTimeouts,
    max_concurrent: usize,
) -> Result<()> {
    let archive_dir = PathBuf::from(ARCHIVE_DIR);
    let error_log = PathBuf::from(ERROR_LOG);
    workspace::reset(&archive_dir, &error_log)?;

    let transport = Arc::new(CurlTransport { timeouts });
    let report = run_downloads(
        &urls.into_urls(),
        &archive_dir,
        token,
        transport,
        max_concurrent,
        &error_log,
    )
    .await;

    println!(
        "downloaded {} archive(s) into ./{}",
        report.downloaded, ARCHIVE_DIR
    );
    if !report.failed.is_empty() {
        println!(
            "{} download(s) failed; ./{} lists the URLs to retry",
            report.failed.len(),
            ERROR_LOG
        );
    }
    Ok(())
}
