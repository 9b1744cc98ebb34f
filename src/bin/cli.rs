//! Thin administrative CLI: opens a registry, evaluates one already
//! structured query or transaction payload against a named connection, and
//! prints the result as JSON.
//!
//! This is explicitly a demonstration surface, not the out-of-scope surface
//! query parser: it only deserializes the already-structured
//! [`tripledb::Query`] / transaction-payload types from JSON, never a
//! textual query language.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use tripledb::query::expr::ExprEnv;
use tripledb::{query, ConnectionRegistry, Query, Triple};

#[derive(Parser, Debug)]
#[command(
    name = "tripledb-cli",
    version,
    about = "Administrative CLI for the tripledb graph database"
)]
struct Cli {
    /// Connection URI, `sys:<kind>://<name>` (kind: simple-graph, multi-graph).
    #[arg(long, global = true, default_value = "sys:simple-graph://default")]
    uri: String,

    /// Transaction timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 100_000)]
    tx_timeout_msec: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a query read from a JSON file (or stdin if omitted).
    Query {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Apply a transaction payload read from a JSON file (or stdin).
    Transact {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Release the connection named by `--uri`.
    Release,
}

/// Mirrors the `{:tx-triples [...]}` transaction payload shape:
/// raw `[e a v]` assertions and retractions, bypassing the out-of-scope
/// entity-to-triples encoder.
#[derive(Debug, Deserialize)]
struct TxPayload {
    #[serde(default)]
    tx_triples: Vec<Triple>,
    #[serde(default)]
    retractions: Vec<Triple>,
}

fn read_input(file: Option<PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run() -> tripledb::Result<()> {
    let cli = Cli::parse();
    let registry = ConnectionRegistry::new();
    let conn = registry.connect(&cli.uri, cli.tx_timeout_msec)?;

    match cli.command {
        Command::Query { file } => {
            let text = read_input(file).map_err(|e| {
                tripledb::GraphError::UnsupportedOperation(format!("reading query input: {e}"))
            })?;
            let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
                tripledb::GraphError::UnsupportedOperation(format!("parsing query json: {e}"))
            })?;
            let q = Query::from_json(value)?;
            let db = conn.current()?;
            let env = ExprEnv::new();
            let result = query(&db.graph, &q, &env, &[])?;
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
        }
        Command::Transact { file } => {
            let text = read_input(file).map_err(|e| {
                tripledb::GraphError::UnsupportedOperation(format!("reading transaction input: {e}"))
            })?;
            let payload: TxPayload = serde_json::from_str(&text).map_err(|e| {
                tripledb::GraphError::UnsupportedOperation(format!("parsing transaction json: {e}"))
            })?;
            let result = conn.transact(|g, tx| {
                (
                    g.transact(tx, &payload.tx_triples, &payload.retractions),
                    [payload.retractions.clone(), payload.tx_triples.clone()].concat(),
                )
            })?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "t_before": result.db_before.t,
                    "t_after": result.db_after.t,
                    "tx_data": result.tx_data,
                }))
                .unwrap()
            );
        }
        Command::Release => {
            registry.release(&cli.uri)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = run() {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
