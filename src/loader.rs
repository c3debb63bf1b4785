//! End-to-end load: resolve the source, fill the tables, build the unified
//! table and drop what the table set does not keep, all in one transaction.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::LoaderConfig;
use crate::database::DatabaseBackend;
use crate::error::LoaderResult;
use crate::reader::TableFilesReader;
use crate::resolver::{DownloadProgress, SourceResolver};
use crate::tables::{TableRegistry, TableSet};
use crate::unified::{UnifiedSummary, UnifiedTableBuilder};
use crate::writer::DatabaseWriter;

/// What a load did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Rows inserted per populated table, in population order
    pub tables: Vec<(String, u64)>,
    /// Rows contributed to the unified table per source
    pub unified: UnifiedSummary,
    /// Tables dropped after the unified table was built
    pub dropped: Vec<String>,
}

impl LoadSummary {
    /// Rows inserted into `table`, if it was populated
    pub fn inserted(&self, table: &str) -> Option<u64> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, n)| *n)
    }
}

/// Open transaction that rolls back unless committed.
struct Transaction<'a> {
    backend: &'a dyn DatabaseBackend,
    finished: bool,
}

impl<'a> Transaction<'a> {
    fn begin(backend: &'a dyn DatabaseBackend) -> LoaderResult<Self> {
        backend.begin()?;
        Ok(Self {
            backend,
            finished: false,
        })
    }

    fn commit(mut self) -> LoaderResult<()> {
        self.finished = true;
        self.backend.commit()?;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Load failed, rolling back all changes");
        if let Err(e) = self.backend.rollback() {
            error!("Rollback failed: {}", e);
        }
    }
}

/// Loads a DNE source into a database
pub struct DneLoader<'a> {
    backend: &'a dyn DatabaseBackend,
    registry: &'a TableRegistry,
    config: LoaderConfig,
    progress: Option<Box<dyn DownloadProgress + 'a>>,
}

impl<'a> DneLoader<'a> {
    pub fn new(backend: &'a dyn DatabaseBackend, registry: &'a TableRegistry) -> Self {
        Self {
            backend,
            registry,
            config: LoaderConfig::default(),
            progress: None,
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Receives download progress when the source is a URL
    pub fn with_progress(mut self, progress: impl DownloadProgress + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Loads `source` (the configured download URL when `None`) keeping the
    /// tables selected by `table_set`.
    ///
    /// Nothing is persisted unless every step succeeds.
    pub fn load(self, source: Option<&str>, table_set: TableSet) -> LoaderResult<LoadSummary> {
        let DneLoader {
            backend,
            registry,
            config,
            progress,
        } = self;

        let mut resolver = SourceResolver::new(registry)
            .with_download_url(config.source.download_url.clone());
        if let Some(root) = &config.source.temp_dir {
            resolver = resolver.with_temp_root(root.clone());
        }
        if let Some(progress) = progress {
            resolver = resolver.with_boxed_progress(progress);
        }
        let resolved = resolver.resolve(source)?;

        let transaction = Transaction::begin(backend)?;
        let writer = DatabaseWriter::new(backend, registry)
            .with_batch_size(config.loader.insert_batch_size);

        let to_populate = table_set.to_populate(registry);
        writer.create_tables(&to_populate)?;
        writer.clean_tables(&to_populate)?;

        let mut summary = LoadSummary::default();
        for name in &to_populate {
            let Some(pattern) = registry.get(name).and_then(|t| t.file_glob.as_deref()) else {
                continue;
            };
            let files = resolved.table_files(pattern);
            let reader = TableFilesReader::new(files, config.loader.read_buffer_size);
            let inserted = writer.populate_table(name, reader)?;
            summary.tables.push((name.to_string(), inserted));
        }
        // Temporary files are no longer needed
        drop(resolved);

        summary.unified = UnifiedTableBuilder::new(backend, registry)
            .with_batch_size(config.loader.unified_batch_size)
            .build()?;

        let to_drop = table_set.to_drop(registry);
        writer.drop_tables(&to_drop)?;
        summary.dropped = to_drop.iter().map(|t| t.to_string()).collect();

        transaction.commit()?;
        info!(
            "Load finished: {} tables populated, {} CEPs in the unified table",
            summary.tables.len(),
            summary.unified.total()
        );
        Ok(summary)
    }
}
