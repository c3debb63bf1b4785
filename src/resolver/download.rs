//! Blocking HTTP download of a source archive.

use std::fs::File;
use std::io::{BufWriter, Read, Write};

use tracing::debug;

use super::{ResolverError, ResolverResult};

/// Size of each block read from the response body.
pub const DOWNLOAD_BLOCK_SIZE: usize = 8 * 1024;

/// Stage of a download reported to a [`DownloadProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Start,
    Progress,
    Finish,
}

/// Receives download progress.
///
/// `read` is the number of bytes in the block just written (zero for
/// [`DownloadPhase::Start`] and [`DownloadPhase::Finish`]). `total` is the
/// announced content length, or `-1` when the server did not send one.
pub trait DownloadProgress {
    fn report(&mut self, read: u64, total: i64, phase: DownloadPhase);
}

impl<F> DownloadProgress for F
where
    F: FnMut(u64, i64, DownloadPhase),
{
    fn report(&mut self, read: u64, total: i64, phase: DownloadPhase) {
        self(read, total, phase)
    }
}

/// Streams `url` into `dest`.
pub(crate) fn download(
    url: &str,
    dest: File,
    mut progress: Option<&mut (dyn DownloadProgress + '_)>,
) -> ResolverResult<u64> {
    let failed = |reason: String| ResolverError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(None)
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| failed(e.to_string()))?;

    let total = response
        .content_length()
        .and_then(|len| i64::try_from(len).ok())
        .unwrap_or(-1);
    debug!("Downloading {} ({} bytes)", url, total);

    if let Some(p) = progress.as_deref_mut() {
        p.report(0, total, DownloadPhase::Start);
    }

    let mut writer = BufWriter::new(dest);
    let mut block = vec![0u8; DOWNLOAD_BLOCK_SIZE];
    let mut written = 0u64;
    loop {
        let n = response
            .read(&mut block)
            .map_err(|e| failed(e.to_string()))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&block[..n])
            .map_err(|e| ResolverError::Io(e.to_string()))?;
        written += n as u64;
        if let Some(p) = progress.as_deref_mut() {
            p.report(n as u64, total, DownloadPhase::Progress);
        }
    }
    writer
        .flush()
        .map_err(|e| ResolverError::Io(e.to_string()))?;

    if let Some(p) = progress.as_deref_mut() {
        p.report(0, total, DownloadPhase::Finish);
    }

    Ok(written)
}
