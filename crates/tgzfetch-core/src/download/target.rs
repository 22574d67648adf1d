//! Download target derivation from tarball URLs.

use anyhow::{Context, Result};
use url::Url;

/// One downloadable item: the URL and the local filename derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub file_name: String,
}

/// Derives a `DownloadTarget` from a tarball URL.
///
/// The filename is the path segment after the registry's `/-/` separator
/// (`<basename>-<version>.tgz`). A URL that does not parse as http(s) or
/// lacks the separator rejects only this item; the caller reports it and
/// moves on.
pub fn parse_target(url: &str) -> Result<DownloadTarget> {
    let parsed = Url::parse(url).with_context(|| format!("invalid URL: {}", url))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("invalid URL (not http/https): {}", url);
    }
    let file_name = match parsed.path().split_once("/-/") {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => anyhow::bail!("cannot derive a filename from URL: {}", url),
    };
    Ok(DownloadTarget {
        url: url.to_string(),
        file_name,
    })
}
