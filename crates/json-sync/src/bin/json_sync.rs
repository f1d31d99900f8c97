//! `json-sync` - apply, transform, invert and compose JSON patches.
//!
//! Usage:
//!   json-sync apply '<patch>' [--strict] [--rigid [--partial]] [--at-path <pointer>]
//!   json-sync transform '<this>' '<other>'
//!   json-sync invert '<patch>'
//!   json-sync compose '<patch>'
//!
//! The document is read from stdin for every command except `compose`.

use std::io::{self, Read, Write};

use clap::{Parser, Subcommand};

use json_sync::json_cli::{apply_json_patch, compose_json_patch, invert_json_patch, transform_json_patch, CliError};
use json_sync::json_patch::ApplyOptions;

#[derive(Parser, Debug)]
#[command(name = "json-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a patch to the document on stdin
    Apply {
        /// Patch as a JSON array
        patch: String,

        /// Fail on the first operation that cannot be applied
        #[arg(long)]
        strict: bool,

        /// Stop at the first failing operation and print the original document
        #[arg(long)]
        rigid: bool,

        /// With --rigid, print the document as applied so far
        #[arg(long, requires = "rigid")]
        partial: bool,

        /// Create missing intermediate objects
        #[arg(long)]
        create_missing_objects: bool,

        /// Pointer prefixed to every operation path
        #[arg(long)]
        at_path: Option<String>,
    },

    /// Rewrite OTHER to run after THIS, both made against the document on stdin
    Transform { this: String, other: String },

    /// Print the patch undoing PATCH on the document on stdin
    Invert { patch: String },

    /// Collapse a patch
    Compose { patch: String },
}

fn read_stdin() -> Result<String, CliError> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn run(command: Command) -> Result<String, CliError> {
    match command {
        Command::Apply {
            patch,
            strict,
            rigid,
            partial,
            create_missing_objects,
            at_path,
        } => {
            let options = ApplyOptions {
                strict,
                silent: false,
                rigid,
                partial,
                at_path,
                create_missing_objects,
            };
            apply_json_patch(read_stdin()?.trim(), &patch, &options)
        }
        Command::Transform { this, other } => transform_json_patch(read_stdin()?.trim(), &this, &other),
        Command::Invert { patch } => invert_json_patch(read_stdin()?.trim(), &patch),
        Command::Compose { patch } => compose_json_patch(&patch),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(out) => {
            let mut stdout = io::stdout();
            if let Err(e) = writeln!(stdout, "{out}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
