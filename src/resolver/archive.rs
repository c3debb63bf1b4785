//! ZIP handling for the two archive layouts the Correios publish: the outer
//! package wrapping an `eDNE_Basico_<version>.zip`, and the basic package
//! itself.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::{DELIMITED_SUBDIR, ResolverError, ResolverResult};

const INNER_ARCHIVE_PREFIX: &str = "edne_basico_";
const INNER_ARCHIVE_SUFFIX: &str = ".zip";
const README_FILE: &str = "leiame.txt";
const DATA_FILE_SUFFIX: &str = ".txt";

pub(crate) fn open(path: &Path) -> ResolverResult<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| ResolverError::Io(e.to_string()))?;
    ZipArchive::new(file).map_err(|_| ResolverError::InvalidArchive(path.display().to_string()))
}

/// Name of a top-level basic package archive inside `archive`, if any.
pub(crate) fn find_inner_archive(archive: &ZipArchive<File>) -> Option<String> {
    archive
        .file_names()
        .find(|name| is_inner_archive(name))
        .map(str::to_string)
}

pub(crate) fn is_inner_archive(name: &str) -> bool {
    let lowered = name.to_lowercase();
    !lowered.contains('/')
        && lowered.starts_with(INNER_ARCHIVE_PREFIX)
        && lowered.ends_with(INNER_ARCHIVE_SUFFIX)
}

/// Whether an entry belongs to the basic package layout: the readme at the
/// top level, or a text file under the delimited data directory.
pub(crate) fn is_basic_file(name: &str) -> bool {
    let lowered = name.to_lowercase();
    let data_prefix = format!("{}/", DELIMITED_SUBDIR.to_lowercase());
    lowered == README_FILE
        || (lowered.starts_with(&data_prefix) && lowered.ends_with(DATA_FILE_SUFFIX))
}

/// Extracts every basic package entry into `dest`. Returns how many entries
/// were extracted.
pub(crate) fn extract_basic_files(
    archive: &mut ZipArchive<File>,
    archive_path: &Path,
    dest: &Path,
) -> ResolverResult<usize> {
    let names: Vec<String> = archive
        .file_names()
        .filter(|name| is_basic_file(name))
        .map(str::to_string)
        .collect();

    for name in &names {
        extract_entry(archive, archive_path, name, dest)?;
    }

    Ok(names.len())
}

/// Extracts the entry `name` below `dest`, keeping its relative path.
pub(crate) fn extract_entry(
    archive: &mut ZipArchive<File>,
    archive_path: &Path,
    name: &str,
    dest: &Path,
) -> ResolverResult<PathBuf> {
    let invalid = || ResolverError::InvalidArchive(archive_path.display().to_string());

    let mut entry = archive.by_name(name).map_err(|_| invalid())?;
    let relative = entry.enclosed_name().ok_or_else(invalid)?;
    let target = dest.join(relative);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ResolverError::Io(e.to_string()))?;
    }
    let mut out = File::create(&target).map_err(|e| ResolverError::Io(e.to_string()))?;
    io::copy(&mut entry, &mut out).map_err(|_| invalid())?;

    Ok(target)
}
