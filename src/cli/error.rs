//! CLI-specific error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::database::DatabaseError;
use crate::error::LoaderError;

/// Exit code for operational failures
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for a CEP missing from the unified table
pub const EXIT_CEP_NOT_FOUND: i32 = 3;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("CEP not found")]
    CepNotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("Failed to write output: {0}")]
    Output(String),
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::CepNotFound(_) => EXIT_CEP_NOT_FOUND,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverError;

    #[test]
    fn test_not_found_has_its_own_exit_code() {
        let err = CliError::CepNotFound("00000000".to_string());
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "CEP not found");
    }

    #[test]
    fn test_operational_errors_exit_with_one() {
        let err = CliError::from(LoaderError::from(ResolverError::SourceNotFound(
            "missing.zip".into(),
        )));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("missing.zip"));

        let err = CliError::from(DatabaseError::InvalidConnectionString("x".to_string()));
        assert_eq!(err.exit_code(), 1);
    }
}
