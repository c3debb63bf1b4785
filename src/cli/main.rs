//! CLI binary entry point for edne-loader

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use edne_loader::cli::CliError;
#[cfg(feature = "cli")]
use edne_loader::cli::commands::load::{LoadArgs, handle_load};
#[cfg(feature = "cli")]
use edne_loader::cli::commands::query::{QueryCepArgs, handle_query_cep};
#[cfg(feature = "cli")]
use edne_loader::tables::TableSet;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "edne-loader")]
#[command(about = "Load the Correios eDNE postal-code database")]
#[command(version)]
struct Cli {
    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Load a DNE package into a database
    Load {
        /// DNE directory, ZIP file or URL (default: latest package from Correios)
        #[arg(short = 's', long)]
        dne_source: Option<String>,
        /// Destination database (postgres://..., duckdb://<path> or a file path)
        #[arg(long)]
        database_url: String,
        /// Tables to keep after loading
        #[arg(long, value_enum, ignore_case = true, default_value = "unified-cep-only")]
        tables: TableSetArg,
        /// Configuration file (default: ./edne-loader.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Look up a CEP in a loaded database
    QueryCep {
        /// Database holding the unified CEP table
        #[arg(long)]
        database_url: String,
        /// CEP to look up (e.g. 01001-000 or 01001000)
        cep: String,
    },
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum TableSetArg {
    UnifiedCepOnly,
    CepTables,
    All,
}

#[cfg(feature = "cli")]
fn convert_table_set(arg: TableSetArg) -> TableSet {
    match arg {
        TableSetArg::UnifiedCepOnly => TableSet::UnifiedCepOnly,
        TableSetArg::CepTables => TableSet::CepTables,
        TableSetArg::All => TableSet::AllTables,
    }
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("edne_loader=debug")
        } else {
            EnvFilter::new("edne_loader=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Load {
            dne_source,
            database_url,
            tables,
            config,
        } => {
            let args = LoadArgs {
                source: dne_source,
                database_url,
                tables: convert_table_set(tables),
                config,
            };
            handle_load(&args)
        }
        Commands::QueryCep { database_url, cep } => {
            let args = QueryCepArgs { database_url, cep };
            handle_query_cep(&args)
        }
    };

    match result {
        Ok(()) => {}
        Err(e @ CliError::CepNotFound(_)) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
