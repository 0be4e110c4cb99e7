use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::{Path, PathBuf},
};

use bike_share::{client::Client, RequestError};
use clap::{Parser, Subcommand};
use database::{DatabaseConnectionInfo, PgDatabase};
use jcdecaux::{DynamicStationRecord, FeedError, StaticStationRecord};
use model::ColumnInfo;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(
        "expected database connection info in env \
         (DATABASE_USER, DATABASE_PASSWORD, DATABASE_HOST, DATABASE_PORT, DATABASE_NAME)"
    )]
    MissingConnectionInfo,
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not write output: {0}")]
    Output(#[from] io::Error),
    #[error("could not encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

#[derive(Debug, Parser)]
#[command(
    name = "bike-ingest",
    about = "Stores bike-share station data in a PostgreSQL database",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database and its tables, if missing.
    Init,
    /// Insert static station data from a JSON dump of the station list.
    Stations {
        /// JSON file, `-` reads from stdin.
        file: PathBuf,
    },
    /// Insert availability snapshots from a JSON dump of the station list.
    Availability {
        /// JSON file, `-` reads from stdin.
        file: PathBuf,
    },
    /// Print the column types of the station and availability tables.
    Inspect {
        /// Print a JSON array instead of one line per column.
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(cli: Cli) -> Result<(), IngestError> {
    let database_connection_info =
        DatabaseConnectionInfo::from_env().ok_or(IngestError::MissingConnectionInfo)?;
    let client = Client::new("JCDecaux", PgDatabase::new(database_connection_info));

    let result = execute(&client, cli.command).await;
    client.close().await;
    result
}

async fn execute(
    client: &Client<PgDatabase>,
    command: Command,
) -> Result<(), IngestError> {
    match command {
        Command::Init => {
            client.ensure_schema().await?;
        }
        Command::Stations { file } => {
            let records: Vec<StaticStationRecord> =
                jcdecaux::parse_records(open(&file)?)?;
            let inserted = jcdecaux::insert_static_data(client, records).await?;
            log::info!("stored {} stations from {}", inserted, file.display());
        }
        Command::Availability { file } => {
            let records: Vec<DynamicStationRecord> =
                jcdecaux::parse_records(open(&file)?)?;
            let inserted = jcdecaux::insert_dynamic_data(client, records).await?;
            log::info!(
                "stored {} availability snapshots from {}",
                inserted,
                file.display()
            );
        }
        Command::Inspect { json } => {
            let columns = client.inspect_schema().await?;
            write_columns(io::stdout().lock(), &columns, json)?;
        }
    }
    Ok(())
}

fn write_columns<W: Write>(
    mut out: W,
    columns: &[ColumnInfo],
    json: bool,
) -> Result<(), IngestError> {
    if json {
        serde_json::to_writer_pretty(&mut out, columns)?;
        writeln!(out)?;
    } else {
        for column in columns {
            writeln!(out, "{}", column)?;
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<Box<dyn Read>, IngestError> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    File::open(path)
        .map(|file| Box::new(BufReader::new(file)) as Box<dyn Read>)
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })
}
