//! Streaming reader for the delimited eDNE text files.
//!
//! Files are read in chunks of roughly `buffer_size` bytes. Each line becomes
//! one [`Row`]: fields are split on `@`, decoded from Windows-1252, trimmed,
//! and empty fields become `None`.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use tracing::{debug, info};

use crate::Row;

/// Field separator of the eDNE delimited layout.
pub const FIELD_DELIMITER: char = '@';

/// Default read chunk size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 1_000_000;

/// Error raised while reading a table file.
#[derive(Debug, thiserror::Error)]
#[error("Failed to read {path}: {source}")]
pub struct ReaderError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Reads every file of one table, in order, as a lazy sequence of rows.
#[derive(Debug, Clone)]
pub struct TableFilesReader {
    files: Vec<PathBuf>,
    buffer_size: usize,
}

impl TableFilesReader {
    pub fn new(files: Vec<PathBuf>, buffer_size: usize) -> Self {
        Self {
            files,
            buffer_size: buffer_size.max(1),
        }
    }
}

impl IntoIterator for TableFilesReader {
    type Item = Result<Row, ReaderError>;
    type IntoIter = Rows;

    fn into_iter(self) -> Rows {
        Rows {
            pending: self.files.into(),
            current: None,
            buffer: VecDeque::new(),
            buffer_size: self.buffer_size,
        }
    }
}

struct OpenFile {
    path: PathBuf,
    reader: BufReader<File>,
}

/// Iterator returned by [`TableFilesReader::into_iter`].
pub struct Rows {
    pending: VecDeque<PathBuf>,
    current: Option<OpenFile>,
    buffer: VecDeque<Row>,
    buffer_size: usize,
}

impl Rows {
    /// Fills the buffer with the next chunk of lines. Returns `false` once
    /// every file is exhausted.
    fn fill(&mut self) -> Result<bool, ReaderError> {
        loop {
            if self.current.is_none() {
                let Some(path) = self.pending.pop_front() else {
                    return Ok(false);
                };
                let file = File::open(&path).map_err(|source| ReaderError {
                    path: path.clone(),
                    source,
                })?;
                info!("Reading {}", display_name(&path));
                self.current = Some(OpenFile {
                    path,
                    reader: BufReader::new(file),
                });
            }

            let Some(open) = self.current.as_mut() else {
                continue;
            };
            let mut read = 0usize;
            let mut lines = 0usize;
            let mut line = Vec::new();
            while read < self.buffer_size {
                line.clear();
                let n = open
                    .reader
                    .read_until(b'\n', &mut line)
                    .map_err(|source| ReaderError {
                        path: open.path.clone(),
                        source,
                    })?;
                if n == 0 {
                    break;
                }
                read += n;
                lines += 1;
                if let Some(row) = parse_line(&line) {
                    self.buffer.push_back(row);
                }
            }

            if read == 0 {
                self.current = None;
                continue;
            }
            debug!("Read {} lines from {}", lines, display_name(&open.path));
            if !self.buffer.is_empty() {
                return Ok(true);
            }
        }
    }
}

impl Iterator for Rows {
    type Item = Result<Row, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() {
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    self.pending.clear();
                    self.current = None;
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Splits one raw line into fields. Blank lines yield `None`.
pub fn parse_line(raw: &[u8]) -> Option<Row> {
    let (text, _, _) = WINDOWS_1252.decode(raw);
    if text.trim().is_empty() {
        return None;
    }
    Some(
        text.split(FIELD_DELIMITER)
            .map(|field| {
                let field = field.trim();
                (!field.is_empty()).then(|| field.to_string())
            })
            .collect(),
    )
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_parse_line_trims_and_nulls() {
        let row = parse_line(b"1@ SP @@S\xe3o Paulo\r\n").unwrap();
        assert_eq!(
            row,
            vec![
                Some("1".to_string()),
                Some("SP".to_string()),
                None,
                Some("São Paulo".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_line_skips_blank() {
        assert!(parse_line(b"\r\n").is_none());
        assert!(parse_line(b"   ").is_none());
    }

    #[test]
    fn test_reads_files_in_order() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "A.TXT", b"1@a\n2@b\n");
        let b = write_file(dir.path(), "B.TXT", b"3@c\n\n4@\n");

        let rows: Vec<Row> = TableFilesReader::new(vec![a, b], 4)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        let keys: Vec<_> = rows.iter().map(|r| r[0].clone().unwrap()).collect();
        assert_eq!(keys, vec!["1", "2", "3", "4"]);
        assert_eq!(rows[3][1], None);
    }

    #[test]
    fn test_small_buffer_reads_everything() {
        let dir = tempdir().unwrap();
        let content: String = (0..50).map(|i| format!("{i}@row {i}\n")).collect();
        let path = write_file(dir.path(), "T.TXT", content.as_bytes());

        let count = TableFilesReader::new(vec![path], 1).into_iter().count();
        assert_eq!(count, 50);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut rows = TableFilesReader::new(vec![dir.path().join("NOPE.TXT")], 10).into_iter();
        let err = rows.next().unwrap().unwrap_err();
        assert!(err.path.ends_with("NOPE.TXT"));
        assert!(rows.next().is_none());
    }
}
