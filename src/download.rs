//! Locating and fetching the monthly spot archives.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Datelike, Utc};
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::errors::WsprDataErr;

/// Base URL the monthly archives are published under.
pub const ARCHIVE_URL: &str = "http://wsprnet.org/archive/";

// Download chunk size. Small enough to keep memory flat on multi hundred
// megabyte archives.
const BUF_SIZE: usize = 2 << 12;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// One month of archive data, identified by year and month.
///
/// A month knows its canonical file name, which the remote server and the
/// local working directory share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveMonth {
    year: i32,
    month: u32,
}

impl ArchiveMonth {
    /// A specific month of a specific year. The month must be 1 through 12.
    pub fn new(year: i32, month: u32) -> Result<Self, WsprDataErr> {
        if month < 1 || month > 12 {
            return Err(WsprDataErr::InvalidMonth(month));
        }

        Ok(ArchiveMonth { year, month })
    }

    /// A month of the current year.
    pub fn this_year(month: u32) -> Result<Self, WsprDataErr> {
        ArchiveMonth::new(Utc::now().year(), month)
    }

    /// The month a run targets when nothing is asked for: the month under
    /// way right now.
    pub fn current() -> Self {
        let today = Utc::now();

        ArchiveMonth {
            year: today.year(),
            month: today.month(),
        }
    }

    /// Canonical file name of this month's archive.
    pub fn file_name(&self) -> String {
        format!("wsprspots-{:04}-{:02}.csv.gz", self.year, self.month)
    }

    /// Remote URL of this month's archive.
    pub fn url(&self) -> String {
        format!("{}{}", ARCHIVE_URL, self.file_name())
    }

    /// Where the local copy of this month's archive lives.
    pub fn local_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(self.file_name())
    }
}

// The freshness rule. Archives only grow while their month is under way, so
// added bytes are the signal for unseen records. A remote rewrite at equal
// length goes unnoticed; force is the override.
fn is_new(remote_len: u64, local_len: u64, force: bool) -> bool {
    force || remote_len > local_len
}

fn local_size(path: &Path) -> u64 {
    fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

/// Download the archive for `month` into `work_dir` when it has new data.
///
/// Returns the local path to ingest, or `None` when this run has nothing to
/// fetch: the remote copy is no longer than the local one, or the remote
/// side failed. Remote failures are logged and treated as no new data; a
/// later run picks up where things stand. Local write failures are real
/// errors.
///
/// With `force` set the size comparison is skipped entirely and the
/// download always happens.
pub fn download_archive(
    month: ArchiveMonth,
    work_dir: &Path,
    force: bool,
) -> Result<Option<PathBuf>, WsprDataErr> {
    download_from(month, ARCHIVE_URL, work_dir, force)
}

fn download_from(
    month: ArchiveMonth,
    base_url: &str,
    work_dir: &Path,
    force: bool,
) -> Result<Option<PathBuf>, WsprDataErr> {
    let url = format!("{}{}", base_url, month.file_name());
    let target = month.local_path(work_dir);

    // Archives run to hundreds of megabytes. Bound the connect, not the
    // transfer; the client's default would cut the body off at thirty
    // seconds.
    let client = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(None)
        .build()?;

    // A forced run never asks the server for its size.
    if !force {
        let remote_len = match remote_size(&client, &url) {
            Some(len) => len,
            None => return Ok(None),
        };

        if !is_new(remote_len, local_size(&target), force) {
            info!("no new data in {}", url);
            return Ok(None);
        }
    }

    info!("downloading {}", url);
    let started = Instant::now();

    let mut response = match client.get(&url).send() {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            warn!("download failed: {} for {}", resp.status(), url);
            return Ok(None);
        }
        Err(err) => {
            warn!("download failed: {}", err);
            return Ok(None);
        }
    };

    // Stream through a temp file in the same directory, then rename. An
    // interrupted transfer never lands on the final path.
    let mut tmp = tempfile::Builder::new()
        .prefix("wsprspots")
        .suffix(".part")
        .tempfile_in(work_dir)?;

    let mut buffer = [0u8; BUF_SIZE];
    let mut total: u64 = 0;
    loop {
        let read = match response.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) => {
                warn!("download interrupted: {}", err);
                return Ok(None);
            }
        };

        tmp.write_all(&buffer[..read])?;
        total += read as u64;
    }

    tmp.persist(&target).map_err(|err| WsprDataErr::IO(err.error))?;
    info!(
        "downloaded {} bytes in {:.1}s",
        total,
        started.elapsed().as_secs_f64()
    );

    Ok(Some(target))
}

// Content length of the remote archive, by HEAD request. Any failure is
// logged and reported as nothing new.
fn remote_size(client: &Client, url: &str) -> Option<u64> {
    let response = match client.head(url).send() {
        Ok(resp) => resp,
        Err(err) => {
            warn!("archive check failed: {}", err);
            return None;
        }
    };

    if !response.status().is_success() {
        warn!("archive check failed: {} for {}", response.status(), url);
        return None;
    }

    // content_length() reports the body size hint, and a HEAD response has
    // no body. The advertised length is only in the header.
    let length = response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.parse::<u64>().ok());

    match length {
        Some(len) => Some(len),
        None => {
            warn!("no content length reported for {}", url);
            None
        }
    }
}
