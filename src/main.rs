//! CLI tool to lint AutoHotkey scripts.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ahklint::report::{Summary, format_file};
use ahklint::{LintOptions, lint};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ahklint", version, about = "Lint AutoHotkey scripts", long_about = None)]
struct Cli {
    /// Files to lint. An argument that is not a file is expanded as a glob
    /// pattern.
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Rule code to turn off. May be repeated.
    #[arg(long, value_name = "RULE")]
    disable: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init();

    let cli = Cli::parse();
    let mut summary = Summary::default();
    let mut failed = false;

    for arg in &cli.files {
        let paths = resolve(arg).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            failed = true;
            Vec::new()
        });
        for path in paths {
            if let Err(e) = lint_file(&cli, &path, &mut summary) {
                eprintln!("Error: {e}");
                failed = true;
            }
        }
    }

    println!("{}", summary.message());
    if failed || summary.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Lint one file and print its diagnostics. Bytes that are not UTF-8 are
/// replaced, so legacy ANSI scripts are still checked.
fn lint_file(cli: &Cli, path: &Path, summary: &mut Summary) -> Result<(), CliError> {
    let bytes = fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let code = String::from_utf8_lossy(&bytes).into_owned();
    let options = cli
        .disable
        .iter()
        .fold(LintOptions::new(code), |options, rule| options.disable(rule));
    // syntax errors come back as diagnostics
    let diagnostics = lint(&options).unwrap_or_default();
    tracing::debug!(path = %path.display(), count = diagnostics.len(), "linted");

    if !diagnostics.is_empty() {
        if summary.files_with_errors > 0 {
            println!();
        }
        print!("{}", format_file(&path.display().to_string(), &diagnostics));
    }
    summary.add(&diagnostics);
    Ok(())
}

/// A readable file as is, anything else as a glob pattern.
fn resolve(arg: &str) -> Result<Vec<PathBuf>, CliError> {
    if Path::new(arg).is_file() {
        return Ok(vec![PathBuf::from(arg)]);
    }

    let paths = glob::glob(arg).map_err(|source| CliError::Pattern {
        pattern: arg.to_string(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "skipping unreadable path"),
        }
    }
    if files.is_empty() {
        tracing::warn!(pattern = arg, "no files matched");
    }
    Ok(files)
}
