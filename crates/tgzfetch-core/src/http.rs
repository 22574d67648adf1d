//! Blocking HTTP helpers over libcurl.
//!
//! Two operations: fetch a small response body into memory (registry
//! metadata JSON) and stream a response body to a local file (tarballs).
//! Both follow redirects and enforce a 2xx status. Runs in the current
//! thread; call from `spawn_blocking` when used from async code.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Connect/total timeouts applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub total: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            total: Duration::from_secs(600),
        }
    }
}

fn new_easy(url: &str, timeouts: HttpTimeouts) -> Result<curl::easy::Easy> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(timeouts.connect)?;
    easy.timeout(timeouts.total)?;
    Ok(easy)
}

fn check_status(easy: &mut curl::easy::Easy, url: &str) -> Result<()> {
    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }
    Ok(())
}

/// Performs a GET and returns the full response body.
pub fn get_bytes(url: &str, timeouts: HttpTimeouts) -> Result<Vec<u8>> {
    let mut body: Vec<u8> = Vec::new();
    let mut easy = new_easy(url, timeouts)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform().context("GET request failed")?;
    }

    check_status(&mut easy, url)?;
    Ok(body)
}

/// Performs a GET and streams the response body to `dest`, creating or
/// truncating the file. When `token` is given it is attached as a
/// Basic-scheme credential. Returns the number of bytes written.
pub fn download_to_file(
    url: &str,
    dest: &Path,
    token: Option<&str>,
    timeouts: HttpTimeouts,
) -> Result<u64> {
    let written = Arc::new(AtomicU64::new(0));
    let written_cb = Arc::clone(&written);

    let mut file = File::create(dest)
        .with_context(|| format!("create file: {}", dest.display()))?;
    let dest_for_log = dest.to_path_buf();

    let mut easy = new_easy(url, timeouts)?;
    if let Some(token) = token {
        let mut list = curl::easy::List::new();
        list.append(&format!("Authorization: Basic {}", token.trim()))?;
        easy.http_headers(list)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.write_function(move |data| {
            match file.write_all(data) {
                Ok(()) => {
                    written_cb.fetch_add(data.len() as u64, Ordering::Relaxed);
                    Ok(data.len())
                }
                Err(e) => {
                    tracing::warn!("write to {} failed: {}", dest_for_log.display(), e);
                    Ok(0) // abort transfer
                }
            }
        })?;
        transfer.perform().context("GET request failed")?;
    }

    check_status(&mut easy, url)?;
    Ok(written.load(Ordering::Relaxed))
}
