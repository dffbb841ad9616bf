//! emx-whitespace CLI
//!
//! Encode whitespace before running a compiler, decode it afterwards.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use emx_whitespace::{Decoder, Encoder, MetadataPlacement, Options, PartialOptions};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "emx-whitespace")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Preserve whitespace across source-to-source compilation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode whitespace into marker comments
    Encode {
        #[command(flatten)]
        target: IoArgs,

        /// JSON file with codec options (camelCase keys)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Do not preserve blank lines
        #[arg(long)]
        no_new_lines: bool,

        /// Do not preserve runs of spaces
        #[arg(long)]
        no_multiple_spaces: bool,

        /// Do not preserve spaces before colons
        #[arg(long)]
        no_spaces_before_colons: bool,

        /// Keep spacing of colons the compiler removed
        #[arg(long)]
        no_collapse: bool,

        /// Do not preserve `} else` on one line
        #[arg(long)]
        no_same_line_else: bool,

        /// Report tag collisions
        #[arg(long)]
        debug: bool,

        /// Insert the metadata block after the first statement
        #[arg(long)]
        after_statement: bool,
    },

    /// Restore whitespace from marker comments
    Decode {
        #[command(flatten)]
        target: IoArgs,
    },
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Files or directories to rewrite in place (default: stdin to stdout)
    inputs: Vec<PathBuf>,

    /// Output file when reading stdin (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Extensions picked up when walking directories
    #[arg(long, value_delimiter = ',', default_value = "ts,tsx,js,jsx")]
    ext: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            target,
            config,
            no_new_lines,
            no_multiple_spaces,
            no_spaces_before_colons,
            no_collapse,
            no_same_line_else,
            debug,
            after_statement,
        } => {
            init_logging(target.verbose, debug);

            let from_file = match config {
                Some(path) => load_config(&path)?,
                None => PartialOptions::default(),
            };
            let from_flags = PartialOptions {
                preserve_new_lines: no_new_lines.then_some(false),
                preserve_multiple_spaces: no_multiple_spaces.then_some(false),
                preserve_spaces_before_colons: no_spaces_before_colons.then_some(false),
                collapse_spaces_before_removed_colons: no_collapse.then_some(false),
                preserve_same_line_else: no_same_line_else.then_some(false),
                show_debug_output: debug.then_some(true),
            };
            let options = Options::merge(&from_file.overlay(from_flags));

            let placement = if after_statement {
                MetadataPlacement::AfterFirstStatement
            } else {
                MetadataPlacement::FileStart
            };
            let encoder = Encoder::new(options).with_placement(placement);
            info!(options = ?encoder.options(), "encoding");

            run(&target, |text| Ok(encoder.encode(text)))
        }
        Commands::Decode { target } => {
            init_logging(target.verbose, false);

            let decoder = Decoder::new();
            run(&target, |text| Ok(decoder.decode(text)?))
        }
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<PartialOptions> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    PartialOptions::from_json(&json)
        .with_context(|| format!("Invalid config: {}", path.display()))
}

/// Apply `transform` to stdin, or to every input file in place
fn run<F>(io_args: &IoArgs, transform: F) -> Result<()>
where
    F: Fn(&str) -> Result<String>,
{
    if io_args.inputs.is_empty() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        let output = transform(&buffer)?;

        if let Some(path) = &io_args.output {
            fs::write(path, output)
                .with_context(|| format!("Failed to write: {}", path.display()))?;
        } else {
            io::stdout().write_all(output.as_bytes())?;
        }
        return Ok(());
    }

    let files = collect_files(&io_args.inputs, &io_args.ext)?;
    let mut failed = 0;

    for path in &files {
        match rewrite_file(path, &transform) {
            Ok(()) => info!(path = %path.display(), "rewritten"),
            Err(e) => {
                error!(path = %path.display(), "{e:#}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", failed, files.len());
    }
    Ok(())
}

fn rewrite_file<F>(path: &Path, transform: &F) -> Result<()>
where
    F: Fn(&str) -> Result<String>,
{
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;
    let output = transform(&text)?;
    fs::write(path, output).with_context(|| format!("Failed to write: {}", path.display()))?;
    Ok(())
}

/// Expand directories into the files below them with a matching extension
fn collect_files(inputs: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        for entry in walkdir::WalkDir::new(input) {
            let entry = entry.with_context(|| format!("Failed to walk: {}", input.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| x == e));
            if matches {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    Ok(files)
}
