//! ADQL command-line interface

use adql::ParserConfig;
use adql::cli::output::{self, OutputFormat};
use adql::cli::{Input, features, fix, parse, validate};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

/// ADQL command-line tool
#[derive(Parser)]
#[command(name = "adql")]
#[command(author, version, about = "Astronomical Data Query Language (ADQL) tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Parser configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// ADQL version (2.0, 2.1)
    #[arg(long = "adql-version", global = true)]
    adql_version: Option<String>,

    /// Accept calls to undeclared functions
    #[arg(long, num_args = 0..=1, default_missing_value = "true", global = true)]
    allow_udf: Option<bool>,

    /// Disable an optional language feature, by form (e.g. LOWER)
    #[arg(long = "unsupport", value_name = "FORM", global = true)]
    unsupported: Vec<String>,

    /// Declare a function, e.g. "gavo_match(p VARCHAR, s VARCHAR) -> INTEGER"
    #[arg(long = "udf", value_name = "SIGNATURE", global = true)]
    udfs: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print it normalised
    Parse {
        /// Query text (default: read --file or stdin)
        query: Option<String>,

        /// File holding the query
        #[arg(long, conflicts_with = "query")]
        file: Option<PathBuf>,
    },

    /// Validate ADQL files, one query per file
    Validate {
        /// Files to validate
        files: Vec<PathBuf>,
    },

    /// Quote identifiers the parser would reject
    Fix {
        /// Query text (default: read --file or stdin)
        query: Option<String>,

        /// File holding the query
        #[arg(long, conflicts_with = "query")]
        file: Option<PathBuf>,

        /// Parse the fixed query and report remaining errors
        #[arg(long)]
        verify: bool,
    },

    /// List the optional language features of the configured parser
    Features,
}

impl Cli {
    /// Configuration file, overridden by the command-line options
    fn settings(&self) -> Result<ParserConfig> {
        let mut settings = match &self.config {
            Some(path) => ParserConfig::load(path)?,
            None => ParserConfig::default(),
        };
        if let Some(version) = &self.adql_version {
            settings.set_version(version)?;
        }
        if let Some(allow) = self.allow_udf {
            settings.allow_any_udf = allow;
        }
        settings.unsupported.extend(self.unsupported.iter().cloned());
        settings.udfs.extend(self.udfs.iter().cloned());
        Ok(settings)
    }
}

fn install_tracing_subscriber(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = cli.settings()?;
    tracing::debug!(version = %settings.version, "parser configured");

    match cli.command {
        Commands::Parse { query, file } => parse::parse(
            &settings,
            parse::ParseConfig {
                input: Input { query, file },
                format: cli.format,
                verbose: cli.verbose,
            },
        ),

        Commands::Validate { files } => validate::validate(
            &settings,
            validate::ValidateConfig {
                files,
                format: cli.format,
                verbose: cli.verbose,
            },
        ),

        Commands::Fix {
            query,
            file,
            verify,
        } => fix::fix(
            &settings,
            fix::FixConfig {
                input: Input { query, file },
                format: cli.format,
                verify,
            },
        ),

        Commands::Features => features::list(&settings, cli.format).map(|()| ExitCode::SUCCESS),
    }
}

fn main() -> ExitCode {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    install_tracing_subscriber(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", output::format_error(&e));
            ExitCode::FAILURE
        }
    }
}
