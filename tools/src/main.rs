//! ad-runner: line-oriented driver for the ad engine.
//!
//! Reads one JSON command per line on stdin, writes one JSON reply per line
//! on stdout.
//!
//! Usage:
//!   ad-runner --db ads.db
//!   ad-runner --config engine.json --day 3
//!
//!   {"cmd":"advance_day"}
//!   {"cmd":"get_ad","client_id":"c1"}

use adengine_core::{command::EngineCommand, config::EngineConfig, engine::AdEngine};
use anyhow::Result;
use serde::Serialize;
use std::env;
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match find_arg(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(db) = find_arg(&args, "--db") {
        config.database = db.to_string();
    }
    if let Some(day) = find_arg(&args, "--day") {
        config.initial_day = Some(parse_day(day)?);
    }

    let engine = AdEngine::from_config(&config)?;
    run_command_loop(&engine, &config)
}

/// Reply line for a command that failed.
#[derive(Debug, Serialize)]
struct ErrorReply {
    error:     &'static str,
    message:   String,
    retryable: bool,
}

fn run_command_loop(engine: &AdEngine, config: &EngineConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: EngineCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let reply = ErrorReply { error: "bad_request", message: e.to_string(), retryable: false };
                writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, EngineCommand::Quit) {
            break;
        }

        let reply = match engine.execute(cmd, config.default_page_size) {
            Ok(value) => value,
            Err(e) => {
                if e.is_infrastructure() {
                    log::warn!("command failed: {e}");
                }
                serde_json::to_value(ErrorReply {
                    error:     e.kind(),
                    message:   e.to_string(),
                    retryable: e.is_retryable(),
                })?
            }
        };
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }
    Ok(())
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_day(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid --day value '{raw}': {e}"))
}
