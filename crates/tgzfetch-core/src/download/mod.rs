//! Bounded concurrent tarball downloader.
//!
//! Takes the final URL set, derives a filename per URL, and fetches
//! everything in sequential batches of at most `max_concurrent` requests,
//! each batch fully settled before the next starts. A failed item is
//! logged, appended to the error side-file for manual retry, and never
//! cancels its siblings. There is no retry logic; re-running the command
//! is the retry mechanism.

mod target;

pub use target::{parse_target, DownloadTarget};

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::http::{self, HttpTimeouts};

/// Fetches one URL to a local file. Implemented over libcurl in production
/// and by counting fakes in tests. Blocking; the downloader calls it from
/// `spawn_blocking`.
pub trait TarballTransport: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path, token: Option<&str>) -> Result<()>;
}

/// Production transport: streams the response body straight to the
/// destination file, attaching the token as a Basic credential when given.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport {
    pub timeouts: HttpTimeouts,
}

impl TarballTransport for CurlTransport {
    fn fetch(&self, url: &str, dest: &Path, token: Option<&str>) -> Result<()> {
        http::download_to_file(url, dest, token, self.timeouts)?;
        Ok(())
    }
}

/// Outcome of a download run: how many archives landed on disk and which
/// URLs need manual re-attempt.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: u32,
    pub failed: Vec<String>,
}

/// Downloads every URL into `dir` with at most `max_concurrent` requests in
/// flight. Failed URLs (unparseable or transfer errors) are appended to
/// `error_log`, one per line.
pub async fn run_downloads(
    urls: &[String],
    dir: &Path,
    token: Option<&str>,
    transport: Arc<dyn TarballTransport>,
    max_concurrent: usize,
    error_log: &Path,
) -> DownloadReport {
    let mut report = DownloadReport::default();
    if urls.is_empty() {
        tracing::info!("URL set is empty, nothing to download");
        return report;
    }

    let mut targets = Vec::with_capacity(urls.len());
    for url in urls {
        match parse_target(url) {
            Ok(t) => targets.push(t),
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", url, e);
                record_failure(error_log, url, &mut report);
            }
        }
    }

    for batch in targets.chunks(max_concurrent.max(1)) {
        let mut tasks = JoinSet::new();
        for target in batch {
            let target = target.clone();
            let dest = dir.join(&target.file_name);
            let token = token.map(String::from);
            let transport = Arc::clone(&transport);
            tasks.spawn_blocking(move || {
                let res = transport.fetch(&target.url, &dest, token.as_deref());
                (target, res)
            });
        }
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok((target, Ok(()))) => {
                    tracing::info!("{} written", target.file_name);
                    report.downloaded += 1;
                }
                Ok((target, Err(e))) => {
                    tracing::warn!("download of {} failed: {:#}", target.url, e);
                    record_failure(error_log, &target.url, &mut report);
                }
                Err(e) => tracing::error!("download task failed: {}", e),
            }
        }
    }

    report
}

fn record_failure(error_log: &Path, url: &str, report: &mut DownloadReport) {
    report.failed.push(url.to_string());
    if let Err(e) = append_failure(error_log, url) {
        tracing::error!("could not record {} in {}: {:#}", url, error_log.display(), e);
    }
}

/// Appends one failed URL per line to the error side-file.
pub fn append_failure(path: &Path, url: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", url)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Transport that writes a marker file and counts in-flight calls.
    #[derive(Default)]
    struct FakeTransport {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        failing: Mutex<HashSet<String>>,
        delay: Option<Duration>,
    }

    impl FakeTransport {
        fn failing(urls: &[&str]) -> Self {
            Self {
                failing: Mutex::new(urls.iter().map(|u| u.to_string()).collect()),
                ..Default::default()
            }
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Default::default()
            }
        }
    }

    impl TarballTransport for FakeTransport {
        fn fetch(&self, url: &str, dest: &Path, _token: Option<&str>) -> Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            let res = if self.failing.lock().unwrap().contains(url) {
                Err(anyhow::anyhow!("simulated transfer failure"))
            } else {
                std::fs::write(dest, b"fake tarball").map_err(Into::into)
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            res
        }
    }

    fn tarball_urls(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("https://registry.npmjs.org/pkg{i}/-/pkg{i}-1.0.0.tgz"))
            .collect()
    }

    #[tokio::test]
    async fn downloads_lockfile_scenario_target() {
        let dir = tempfile::tempdir().unwrap();
        let error_log = dir.path().join("error.txt");
        let urls = vec!["https://registry.npmjs.org/left-pad/-/left-pad-1.0.1.tgz".to_string()];
        let transport = Arc::new(FakeTransport::default());
        let report = run_downloads(&urls, dir.path(), None, transport, 5, &error_log).await;
        assert_eq!(report.downloaded, 1);
        assert!(report.failed.is_empty());
        assert!(dir.path().join("left-pad-1.0.1.tgz").is_file());
        assert!(!error_log.exists());
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_cap() {
        let dir = tempfile::tempdir().unwrap();
        let error_log = dir.path().join("error.txt");
        let urls = tarball_urls(13);
        let transport = Arc::new(FakeTransport::with_delay(Duration::from_millis(25)));
        let report = run_downloads(&urls, dir.path(), None, transport.clone(), 5, &error_log).await;
        assert_eq!(report.downloaded, 13);
        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn failed_item_is_isolated_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let error_log = dir.path().join("error.txt");
        let urls = tarball_urls(6);
        let bad = urls[3].clone();
        let transport = Arc::new(FakeTransport::failing(&[&bad]));
        let report = run_downloads(&urls, dir.path(), None, transport, 5, &error_log).await;
        assert_eq!(report.downloaded, 5);
        assert_eq!(report.failed, vec![bad.clone()]);
        for (i, url) in urls.iter().enumerate() {
            let target = parse_target(url).unwrap();
            assert_eq!(dir.path().join(target.file_name).is_file(), i != 3);
        }
        let recorded = std::fs::read_to_string(&error_log).unwrap();
        assert_eq!(recorded, format!("{}\n", bad));
    }

    #[tokio::test]
    async fn unparseable_url_fails_only_that_item() {
        let dir = tempfile::tempdir().unwrap();
        let error_log = dir.path().join("error.txt");
        let urls = vec![
            "https://registry.npmjs.org/a/-/a-1.0.0.tgz".to_string(),
            "ftp://mirror.example.com/a/-/a-1.0.0.tgz".to_string(),
        ];
        let transport = Arc::new(FakeTransport::default());
        let report = run_downloads(&urls, dir.path(), None, transport, 5, &error_log).await;
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(std::fs::read_to_string(&error_log)
            .unwrap()
            .contains("ftp://"));
    }

    #[tokio::test]
    async fn empty_url_set_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let error_log = dir.path().join("error.txt");
        let transport = Arc::new(FakeTransport::default());
        let report = run_downloads(&[], dir.path(), None, transport, 5, &error_log).await;
        assert_eq!(report.downloaded, 0);
        assert!(report.failed.is_empty());
    }
}
