//! Command-line wrapper: JSON settings in, `GeneratedMap` JSON out.
//!
//! Exit codes: 0 success, 2 validation error, 3 generation error.

use std::io::Read;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use battlemap_core::{generate, GenerationError, MapSettings};

#[derive(Parser, Debug)]
#[command(name = "battlemap", about = "Deterministic tactical battlemap generator")]
struct Args {
    /// Read settings JSON from this file instead of stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Pretty-print the output JSON.
    #[arg(short, long)]
    pretty: bool,
}

const EXIT_VALIDATION: u8 = 2;
const EXIT_GENERATION: u8 = 3;

fn read_settings(args: &Args) -> Result<String> {
    match &args.input {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {path}"))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn run(args: &Args) -> std::result::Result<(), u8> {
    let raw = read_settings(args).map_err(|e| {
        eprintln!("error: {e:#}");
        EXIT_VALIDATION
    })?;

    let settings: MapSettings = serde_json::from_str(&raw).map_err(|e| {
        eprintln!("error: invalid settings JSON: {e}");
        EXIT_VALIDATION
    })?;

    let map = generate(&settings).map_err(|e| {
        eprintln!("error: {e}");
        match e {
            GenerationError::Validation(_) => EXIT_VALIDATION,
            _ => EXIT_GENERATION,
        }
    })?;

    let out = if args.pretty {
        serde_json::to_string_pretty(&map)
    } else {
        serde_json::to_string(&map)
    }
    .map_err(|e| {
        eprintln!("error: serializing output: {e}");
        EXIT_GENERATION
    })?;

    println!("{out}");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}
