//! serguard-inspect
//!
//! Reads every top-level object of a serialized file through the gate and
//! prints one JSON line per object.
//!
//! Usage: `serguard-inspect <file> [--config <serguard.yaml>]`
//! Exit codes: 0 ok, 1 error, 2 rejected.

use std::fs;
use std::io::{self, Cursor};
use std::process::ExitCode;

use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use serguard_core::protocol::{AnyClass, ObjectInput};
use serguard_core::GuardError;
use serguard_gate::{config, GateOptions, SafeObjectReader};

fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((path, config_path)) = parse_args(&args) else {
        eprintln!("usage: serguard-inspect <file> [--config <serguard.yaml>]");
        return ExitCode::from(1);
    };

    let options = match config_path {
        Some(p) => match config::load_from_file(p) {
            Ok(cfg) => cfg.gate_options(),
            Err(e) => return fail(&e),
        },
        None => GateOptions::default(),
    };

    match inspect(path, options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_security_violation() => {
            println!("{}", json!({ "status": "rejected" }));
            ExitCode::from(2)
        }
        Err(e) => fail(&e),
    }
}

fn parse_args(args: &[String]) -> Option<(&str, Option<&str>)> {
    match args {
        [path] => Some((path.as_str(), None)),
        [path, flag, cfg] if flag == "--config" => Some((path.as_str(), Some(cfg.as_str()))),
        [flag, cfg, path] if flag == "--config" => Some((path.as_str(), Some(cfg.as_str()))),
        _ => None,
    }
}

fn inspect(path: &str, options: GateOptions) -> Result<(), GuardError> {
    let raw = fs::read(path)?;
    let len = raw.len() as u64;
    let mut reader = SafeObjectReader::with_options(Cursor::new(raw), AnyClass, options)?;

    let mut index = 0usize;
    loop {
        let at_end = reader.get_ref().is_some_and(|c| c.position() == len);
        match reader.read_object() {
            Ok(value) => {
                println!(
                    "{}",
                    json!({ "index": index, "kind": value.kind(), "class": value.class_name() })
                );
                index += 1;
            }
            Err(GuardError::Io(e)) if at_end && e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }

    reader.close()?;
    tracing::info!(objects = index, path, "stream inspected");
    Ok(())
}

fn fail(e: &GuardError) -> ExitCode {
    tracing::error!(error = %e, "inspect failed");
    println!(
        "{}",
        json!({ "status": "error", "code": e.code().as_str(), "message": e.to_string() })
    );
    ExitCode::from(1)
}
