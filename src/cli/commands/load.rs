//! Load CLI command
//!
//! Resolves a DNE source and loads it into the target database.

use std::path::PathBuf;

use tracing::info;

use crate::cli::error::CliError;
use crate::cli::progress::DownloadProgressBar;
use crate::config::LoaderConfig;
use crate::database::connect;
use crate::loader::DneLoader;
use crate::tables::{TableRegistry, TableSet, UNIFIED_TABLE};

/// Load command arguments
#[derive(Debug, Clone)]
pub struct LoadArgs {
    /// Directory, ZIP file or URL of the DNE package; the configured
    /// download URL when absent
    pub source: Option<String>,
    /// Destination connection string
    pub database_url: String,
    /// Tables to keep after loading
    pub tables: TableSet,
    /// Explicit configuration file
    pub config: Option<PathBuf>,
}

/// Load a DNE source into the database
pub fn handle_load(args: &LoadArgs) -> Result<(), CliError> {
    let config = LoaderConfig::load(args.config.as_deref())?;
    let backend = connect(&args.database_url)?;
    let registry = TableRegistry::dne();

    info!("Loading tables: {}", args.tables);
    let summary = DneLoader::new(backend.as_ref(), &registry)
        .with_config(config)
        .with_progress(DownloadProgressBar::new())
        .load(args.source.as_deref(), args.tables)?;

    for (table, rows) in &summary.tables {
        info!("{}: {} rows", table, rows);
    }
    for (source, rows) in &summary.unified.phases {
        info!("{} from {}: {} CEPs", UNIFIED_TABLE, source.label(), rows);
    }
    if !summary.dropped.is_empty() {
        info!("Dropped {} source tables", summary.dropped.len());
    }
    Ok(())
}
