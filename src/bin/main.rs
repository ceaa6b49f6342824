//! sqltools CLI - Run SQL through database command-line clients
//!
//! Usage:
//!   sqltools [-c <connection>] tables
//!   sqltools [-c <connection>] exec "select 1;"
//!   sqltools format query.sql
//!
//! Examples:
//!   sqltools connections
//!   sqltools -c "Local Postgres" describe users
//!   echo "select now();" | sqltools exec

use clap::{Parser, Subcommand};
use sqltools::config::{settings_dir, ProfileStore, Settings};
use sqltools::connection::Connection;
use sqltools::format::format_sql;
use sqltools::history::HistoryRing;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqltools")]
#[command(about = "sqltools - Run SQL through database command-line clients")]
#[command(version)]
struct Cli {
    /// Directory holding the settings and connections files
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    /// Connection to use (defaults to the configured default connection)
    #[arg(short, long, global = true)]
    connection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured connections
    Connections,

    /// List tables
    Tables,

    /// List columns
    Columns,

    /// List functions
    Functions,

    /// Describe a table
    Describe {
        /// Table name
        table: String,
    },

    /// Describe a function
    DescribeFunction {
        /// Function name
        function: String,
    },

    /// Show the first rows of a table
    Records {
        /// Table name
        table: String,
    },

    /// Execute queries (reads stdin when none are given)
    Exec {
        /// Queries, run in order as one batch
        queries: Vec<String>,
    },

    /// Format SQL (reads stdin when no file is given)
    Format {
        /// Path to a .sql file
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let dir = match cli.settings_dir.clone().map_or_else(settings_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = match Settings::load_from_dir(&dir) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings from '{}': {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(settings.debug);

    match cli.command {
        Commands::Format { file } => cmd_format(file, &settings),
        command => {
            let profiles = match ProfileStore::load_from_dir(&dir) {
                Ok(profiles) => profiles,
                Err(e) => {
                    eprintln!("Error loading connections from '{}': {}", dir.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            match command {
                Commands::Connections => cmd_connections(&profiles, &settings),
                command => run_on_connection(command, cli.connection.as_deref(), &profiles, &settings).await,
            }
        }
    }
}

fn init_logging(debug: bool) {
    let fallback = if debug { "sqltools=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(io::stderr)
        .init();
}

fn cmd_connections(profiles: &ProfileStore, settings: &Settings) -> ExitCode {
    if profiles.is_empty() {
        println!("No connections configured.");
        return ExitCode::SUCCESS;
    }

    let default = profiles.default_name().or(settings.default.as_deref());
    for profile in profiles.iter() {
        let marker = if Some(profile.name.as_str()) == default { "*" } else { " " };
        println!("{} {} ({}) - {}", marker, profile.name, profile.kind, profile.summary());
    }
    ExitCode::SUCCESS
}

async fn run_on_connection(
    command: Commands,
    name: Option<&str>,
    profiles: &ProfileStore,
    settings: &Settings,
) -> ExitCode {
    let profile = match profiles.resolve(name, settings.default.as_deref()) {
        Ok(profile) => profile.clone(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let history = HistoryRing::shared(settings.history_size);
    let connection = match Connection::open(profile, settings, history) {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match command {
        Commands::Tables => connection.list_tables().await.map(print_rows),
        Commands::Columns => connection.list_columns().await.map(print_rows),
        Commands::Functions => connection.list_functions().await.map(print_rows),
        Commands::Describe { table } => connection.describe_table(&table).await.map(print_text),
        Commands::DescribeFunction { function } => {
            connection.describe_function(&function).await.map(print_text)
        }
        Commands::Records { table } => connection.show_records(&table).await.map(print_text),
        Commands::Exec { queries } => {
            let queries = if queries.is_empty() {
                match read_stdin() {
                    Ok(text) => vec![text],
                    Err(e) => {
                        eprintln!("Error reading stdin: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                queries
            };
            connection.execute_batch(&queries).await.map(print_text)
        }
        Commands::Connections | Commands::Format { .. } => unreachable!("handled before connecting"),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_format(file: Option<PathBuf>, settings: &Settings) -> ExitCode {
    let source = match &file {
        Some(path) => fs::read_to_string(path).map_err(|e| format!("'{}': {}", path.display(), e)),
        None => read_stdin().map_err(|e| format!("stdin: {}", e)),
    };
    let source = match source {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}", e);
            return ExitCode::FAILURE;
        }
    };

    match format_sql(&source, &settings.format) {
        Some(formatted) => {
            println!("{}", formatted);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Could not format the SQL; it was left unchanged.");
            print!("{}", source);
            ExitCode::FAILURE
        }
    }
}

fn read_stdin() -> io::Result<String> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

fn print_rows(rows: Vec<String>) {
    for row in rows {
        println!("{}", row);
    }
}

fn print_text(text: String) {
    print!("{}", text);
}
