//! Terminal rendering of download progress

use indicatif::{ProgressBar, ProgressStyle};

use crate::resolver::{DownloadPhase, DownloadProgress};

const TEMPLATE: &str =
    "[{elapsed_precise}] {bar:50.cyan/blue} {bytes:>10}/{total_bytes:10} {bytes_per_sec}";

/// Progress bar for the source download.
///
/// Draws only when the server reports the content length.
#[derive(Default)]
pub struct DownloadProgressBar {
    bar: Option<ProgressBar>,
}

impl DownloadProgressBar {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&mut self, total: i64) {
        let Ok(total) = u64::try_from(total) else {
            return;
        };
        let bar = ProgressBar::new(total);
        match ProgressStyle::default_bar().template(TEMPLATE) {
            Ok(style) => bar.set_style(style.progress_chars("##-")),
            Err(e) => tracing::debug!("Using default progress style: {}", e),
        }
        self.bar = Some(bar);
    }
}

impl DownloadProgress for DownloadProgressBar {
    fn report(&mut self, read: u64, total: i64, phase: DownloadPhase) {
        match phase {
            DownloadPhase::Start => self.start(total),
            DownloadPhase::Progress => {
                if let Some(bar) = &self.bar {
                    bar.inc(read);
                }
            }
            DownloadPhase::Finish => {
                if let Some(bar) = self.bar.take() {
                    bar.finish();
                }
            }
        }
    }
}
