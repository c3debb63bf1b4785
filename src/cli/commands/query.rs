//! CEP lookup CLI command

use std::io::Write;

use crate::cli::error::CliError;
use crate::database::connect;
use crate::querier::{CepQuerier, UnifiedRecord};

/// Query command arguments
#[derive(Debug, Clone)]
pub struct QueryCepArgs {
    /// Database holding a loaded unified table
    pub database_url: String,
    /// CEP to look up, with or without the dash
    pub cep: String,
}

/// Look up a CEP and print its record as JSON
pub fn handle_query_cep(args: &QueryCepArgs) -> Result<(), CliError> {
    let backend = connect(&args.database_url)?;
    let record = CepQuerier::new(backend.as_ref()).query(&args.cep)?;
    let Some(record) = record else {
        return Err(CliError::CepNotFound(args.cep.clone()));
    };

    let stdout = std::io::stdout();
    write_record(&mut stdout.lock(), &record)
}

/// Write `record` as pretty-printed JSON followed by a newline
pub fn write_record(out: &mut impl Write, record: &UnifiedRecord) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, record)
        .map_err(|e| CliError::Output(e.to_string()))?;
    writeln!(out).map_err(|e| CliError::Output(e.to_string()))
}
