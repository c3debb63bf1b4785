//! Resolution of a DNE source (URL, ZIP, nested ZIP or directory) into a
//! local directory holding the delimited data files.
//!
//! ```no_run
//! use edne_loader::resolver::SourceResolver;
//! use edne_loader::tables::TableRegistry;
//!
//! let registry = TableRegistry::dne();
//! let resolved = SourceResolver::new(&registry).resolve(Some("eDNE_Basico.zip"))?;
//! println!("data files in {}", resolved.path().display());
//! // temporary files are removed when `resolved` goes out of scope
//! # Ok::<(), edne_loader::resolver::ResolverError>(())
//! ```

mod archive;
mod artifacts;
mod download;

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, info, warn};

use crate::tables::TableRegistry;

pub use artifacts::{ArtifactKind, TempArtifact, TempArtifacts};
pub use download::{DOWNLOAD_BLOCK_SIZE, DownloadPhase, DownloadProgress};

/// Directory holding the delimited files inside a basic package.
pub const DELIMITED_SUBDIR: &str = "Delimitado";

/// Where the latest basic package is published.
pub const LATEST_DNE_DOWNLOAD_URL: &str =
    "https://www2.correios.com.br/sistemas/edne/download/eDNE_Basico.zip";

/// Error type for source resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("DNE source not found: {0}")]
    SourceNotFound(String),

    #[error("Source is not a valid ZIP file: {0}")]
    InvalidArchive(String),

    #[error("ZIP file does not contain DNE Basico files: {0}")]
    MissingArchiveFiles(String),

    #[error("DNE data file not found: {0}")]
    DataFileNotFound(String),

    #[error("Failed to download DNE from {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for source resolution
pub type ResolverResult<T> = Result<T, ResolverError>;

/// A resolved data directory.
///
/// Owns every temporary artifact created during resolution; they are deleted
/// when this value is dropped.
#[derive(Debug)]
pub struct ResolvedSource {
    path: PathBuf,
    artifacts: TempArtifacts,
}

impl ResolvedSource {
    /// Directory holding the table files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temporary artifacts still alive.
    pub fn artifacts(&self) -> &TempArtifacts {
        &self.artifacts
    }

    /// Files of the table whose glob is `pattern`, sorted by name.
    pub fn table_files(&self, pattern: &str) -> Vec<PathBuf> {
        find_table_files(&self.path, pattern)
    }
}

/// Turns a source descriptor into a [`ResolvedSource`].
pub struct SourceResolver<'a> {
    registry: &'a TableRegistry,
    download_url: String,
    temp_root: Option<PathBuf>,
    progress: Option<Box<dyn DownloadProgress + 'a>>,
}

impl<'a> SourceResolver<'a> {
    pub fn new(registry: &'a TableRegistry) -> Self {
        Self {
            registry,
            download_url: LATEST_DNE_DOWNLOAD_URL.to_string(),
            temp_root: None,
            progress: None,
        }
    }

    /// URL used when no source is given.
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    /// Directory under which temporary artifacts are created.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn with_progress(self, progress: impl DownloadProgress + 'a) -> Self {
        self.with_boxed_progress(Box::new(progress))
    }

    pub(crate) fn with_boxed_progress(mut self, progress: Box<dyn DownloadProgress + 'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Resolves `source`, or the default download URL when `None`.
    ///
    /// On error every temporary artifact created so far is removed before
    /// the error is returned.
    pub fn resolve(mut self, source: Option<&str>) -> ResolverResult<ResolvedSource> {
        info!("Resolving DNE source...");
        let mut artifacts = TempArtifacts::new(self.temp_root.clone());

        let source = match source {
            Some(source) => source.to_string(),
            None => {
                info!(
                    "No DNE source provided, the latest DNE will be downloaded from {}",
                    self.download_url
                );
                self.download_url.clone()
            }
        };

        match self.resolve_source(&mut artifacts, &source) {
            Ok(path) => {
                info!("DNE source resolved to {}", path.display());
                Ok(ResolvedSource { path, artifacts })
            }
            Err(e) => {
                if !artifacts.is_empty() {
                    warn!("Something went wrong. Removing temporary files...");
                }
                artifacts.remove(false);
                Err(e)
            }
        }
    }

    fn resolve_source(
        &mut self,
        artifacts: &mut TempArtifacts,
        source: &str,
    ) -> ResolverResult<PathBuf> {
        let mut path = PathBuf::from(source);

        if looks_like_url(source) {
            debug!("Source identified as URL");
            path = self.download(artifacts, source)?;
            debug!("DNE downloaded to {}", path.display());
        }

        if path.is_file() {
            path = self.resolve_file(artifacts, &path)?;
            artifacts.remove(true);
        }

        if path.is_dir() {
            return self.resolve_dir(artifacts, &path);
        }

        Err(ResolverError::SourceNotFound(path.display().to_string()))
    }

    fn download(&mut self, artifacts: &mut TempArtifacts, url: &str) -> ResolverResult<PathBuf> {
        let (file, path) = artifacts
            .create_file()
            .map_err(|e| ResolverError::Io(e.to_string()))?;
        info!("Downloading {}", url);
        let size = download::download(url, file, self.progress.as_deref_mut())?;
        debug!("Downloaded {} bytes", size);
        Ok(path)
    }

    fn resolve_file(&mut self, artifacts: &mut TempArtifacts, path: &Path) -> ResolverResult<PathBuf> {
        let mut zip = archive::open(path)?;
        debug!("Source identified as ZIP file: {}", path.display());

        if let Some(inner) = archive::find_inner_archive(&zip) {
            debug!("Source is a ZIP file containing a DNE Basico ZIP file");
            let dir = artifacts
                .create_dir()
                .map_err(|e| ResolverError::Io(e.to_string()))?;
            debug!("Extracting {} to {}", inner, dir.display());
            let extracted = archive::extract_entry(&mut zip, path, &inner, &dir)?;
            drop(zip);
            return self.resolve_source(artifacts, &extracted.to_string_lossy());
        }

        if !zip.file_names().any(archive::is_basic_file) {
            return Err(ResolverError::MissingArchiveFiles(
                path.display().to_string(),
            ));
        }

        let dir = artifacts
            .create_dir()
            .map_err(|e| ResolverError::Io(e.to_string()))?;
        let count = archive::extract_basic_files(&mut zip, path, &dir)?;
        debug!(
            "Source is a DNE Basico ZIP file, extracted {} files to {}",
            count,
            dir.display()
        );
        Ok(dir)
    }

    fn resolve_dir(&mut self, artifacts: &mut TempArtifacts, dir: &Path) -> ResolverResult<PathBuf> {
        let registry = self.registry;
        for table in registry.file_tables() {
            let Some(pattern) = table.file_glob.as_deref() else {
                continue;
            };
            if !find_table_files(dir, pattern).is_empty() {
                continue;
            }
            if let Some(subdir) = find_delimited_subdir(dir) {
                debug!("Looking for data files in {}", subdir.display());
                return self.resolve_source(artifacts, &subdir.to_string_lossy());
            }
            return Err(ResolverError::DataFileNotFound(
                dir.join(pattern).display().to_string(),
            ));
        }
        Ok(dir.to_path_buf())
    }
}

/// Rough check for an absolute `http`/`https` URL.
pub fn looks_like_url(source: &str) -> bool {
    reqwest::Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

/// Regular files directly inside `dir` whose name matches `pattern`,
/// ignoring case, sorted by path.
pub fn find_table_files(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let Ok(pattern) = Pattern::new(pattern) else {
        return Vec::new();
    };
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches_with(name, options))
        })
        .collect();
    files.sort();
    files
}

/// The delimited data subdirectory of `dir`, matched ignoring case.
fn find_delimited_subdir(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.eq_ignore_ascii_case(DELIMITED_SUBDIR))
        })
}
