//! Command-line transport for the VeryScan lending core.
//!
//! # Responsibility
//! - Parse one lending command and run it against a SQLite item database.
//! - Print a JSON acknowledgement or a JSON error with a per-kind exit code.

use clap::{Parser, Subcommand};
use log::info;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use veryscan_core::db::open_db;
use veryscan_core::{
    default_log_level, init_logging, ErrorKind, ItemStore, LendingCommand, LendingResult,
    LendingService, SqliteItemStore, WriteStrategy,
};

#[derive(Parser, Debug)]
#[command(name = "veryscan")]
#[command(version, about = "Check out, return and flag lab inventory items")]
struct Cli {
    /// SQLite item database holding existing item records
    #[arg(long, env = "VERYSCAN_DB")]
    db: PathBuf,

    /// How commands reach the store: overwrite or compare-and-swap
    #[arg(long, env = "VERYSCAN_STRATEGY", default_value = "overwrite", value_parser = parse_strategy)]
    strategy: WriteStrategy,

    /// Log level (trace|debug|info|warn|error); needs --log-dir, defaults by build mode
    #[arg(long, env = "VERYSCAN_LOG_LEVEL", requires = "log_dir")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "VERYSCAN_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lend an item to a student
    Checkout { item_id: String, actor_name: String },
    /// Put an item back on the shelf
    Return { item_id: String },
    /// Report an item as broken or suspicious
    Flag { item_id: String },
    /// Print the current record of an item
    Show { item_id: String },
}

/// Each invocation runs one command in its own process, so an in-process
/// per-item queue would never be shared; only strategies that serialize
/// through the database are accepted.
fn parse_strategy(value: &str) -> Result<WriteStrategy, String> {
    match WriteStrategy::parse(value) {
        Some(WriteStrategy::PerItemQueue) => Err(format!(
            "strategy `{value}` only serializes commands inside one process; \
             use compare-and-swap to guard concurrent veryscan invocations"
        )),
        Some(strategy) => Ok(strategy),
        None => Err(format!(
            "unknown strategy `{value}`; expected overwrite|compare-and-swap"
        )),
    }
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::InvalidRequest => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::StoreUnavailable => 4,
        ErrorKind::Conflict => 5,
    }
}

fn fail(kind: &str, message: &str, code: u8) -> ExitCode {
    eprintln!(
        "{}",
        json!({ "success": false, "kind": kind, "message": message })
    );
    ExitCode::from(code)
}

fn run<S: ItemStore>(service: &LendingService<S>, command: Command) -> LendingResult<Value> {
    let command = match command {
        Command::Show { item_id } => {
            let record = service.item(item_id)?;
            return Ok(json!({ "success": true, "item": record }));
        }
        Command::Checkout {
            item_id,
            actor_name,
        } => LendingCommand::checkout(item_id, actor_name),
        Command::Return { item_id } => LendingCommand::return_item(item_id),
        Command::Flag { item_id } => LendingCommand::flag(item_id),
    };

    let ack = service.execute(&command)?;
    Ok(json!({ "success": true, "itemId": ack.item_id, "message": ack.message }))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(message) = init_logging(level, log_dir) {
            return fail("invalid_config", &message, 1);
        }
    }

    let unavailable = ErrorKind::StoreUnavailable;
    if !cli.db.is_file() {
        let message = format!("item database not found: {}", cli.db.display());
        return fail(unavailable.as_str(), &message, exit_code(unavailable));
    }
    let conn = match open_db(&cli.db) {
        Ok(conn) => conn,
        Err(err) => return fail(unavailable.as_str(), &err.to_string(), exit_code(unavailable)),
    };

    info!(
        "event=cli_command module=cli status=start strategy={}",
        cli.strategy.as_str()
    );
    let service = LendingService::new(SqliteItemStore::new(&conn)).with_strategy(cli.strategy);
    match run(&service, cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => fail(err.kind().as_str(), &err.to_string(), exit_code(err.kind())),
    }
}
